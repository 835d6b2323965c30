use crate::document::model::{AnimationDocument, DocumentMetadata};
use crate::foundation::core::Disposal;
use crate::foundation::error::{GifDocError, GifDocResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File name of the manifest written by [`export_archive`].
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Serialize a document as pretty-printed JSON.
pub fn to_json_string(doc: &AnimationDocument) -> GifDocResult<String> {
    serde_json::to_string_pretty(doc)
        .map_err(|e| GifDocError::Other(anyhow::anyhow!("serialize animation document: {e}")))
}

/// Write a document as pretty-printed JSON to `path`, creating parent directories.
pub fn write_json(doc: &AnimationDocument, path: impl AsRef<Path>) -> GifDocResult<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let f = File::create(path)
        .map_err(|e| GifDocError::io(format!("create '{}': {e}", path.display())))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, doc)
        .map_err(|e| GifDocError::io(format!("write document JSON '{}': {e}", path.display())))?;
    w.flush()
        .map_err(|e| GifDocError::io(format!("flush '{}': {e}", path.display())))
}

fn ensure_parent_dir(path: &Path) -> GifDocResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            GifDocError::io(format!("create output directory '{}': {e}", parent.display()))
        })?;
    }
    Ok(())
}

/// One manifest frame: a [`crate::FrameRecord`] whose image is a file name.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArchiveFrame {
    /// 0-based position in emission order.
    pub index: u32,
    /// Display time in milliseconds.
    pub delay: u32,
    /// File name of the frame image, relative to the manifest.
    pub image: String,
    /// Patch width.
    pub width: u32,
    /// Patch height.
    pub height: u32,
    /// Left offset.
    pub x: u32,
    /// Top offset.
    pub y: u32,
    /// Disposal method code.
    pub disposal: Disposal,
}

/// Manifest written next to the per-frame image files.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveManifest {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Number of frames.
    pub frame_count: u32,
    /// Total play time in milliseconds.
    pub duration: u64,
    /// Declared loop count.
    pub loop_count: u32,
    /// Frames with image file references.
    pub frames: Vec<ArchiveFrame>,
    /// Source metadata, when the document carried it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

/// Split a document into `manifest.json` plus one image file per frame under `dir`.
#[tracing::instrument(skip_all, fields(frames = doc.frame_count()))]
pub fn export_archive(
    doc: &AnimationDocument,
    dir: impl AsRef<Path>,
) -> GifDocResult<ArchiveManifest> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| {
        GifDocError::io(format!("create archive directory '{}': {e}", dir.display()))
    })?;

    let mut frames = Vec::with_capacity(doc.frames().len());
    for frame in doc.frames() {
        let still = frame.image.to_still()?;
        let name = format!("frame_{:04}.{}", frame.index, still.format.extension());
        let path = dir.join(&name);
        std::fs::write(&path, &still.bytes)
            .map_err(|e| GifDocError::io(format!("write frame image '{}': {e}", path.display())))?;

        frames.push(ArchiveFrame {
            index: frame.index,
            delay: frame.delay,
            image: name,
            width: frame.width,
            height: frame.height,
            x: frame.x,
            y: frame.y,
            disposal: frame.disposal,
        });
    }

    let manifest = ArchiveManifest {
        width: doc.width(),
        height: doc.height(),
        frame_count: doc.frame_count(),
        duration: doc.duration(),
        loop_count: doc.loop_count(),
        frames,
        metadata: doc.metadata().cloned(),
    };

    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    let f = File::create(&manifest_path)
        .map_err(|e| GifDocError::io(format!("create '{}': {e}", manifest_path.display())))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &manifest).map_err(|e| {
        GifDocError::io(format!("write manifest '{}': {e}", manifest_path.display()))
    })?;
    w.flush()
        .map_err(|e| GifDocError::io(format!("flush '{}': {e}", manifest_path.display())))?;

    tracing::debug!(frames = manifest.frames.len(), "wrote frame archive");
    Ok(manifest)
}

#[cfg(test)]
#[path = "../../tests/unit/document/export.rs"]
mod tests;
