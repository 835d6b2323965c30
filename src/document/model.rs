use crate::foundation::core::Disposal;
use crate::foundation::error::{GifDocError, GifDocResult};
use crate::render::patch_encoder::{EncodedStill, StillFormat};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::io::Read;

/// A frame's re-encoded image, self-contained and independently decodable.
///
/// Serialized either as a data URL string or as a `{ "mime", "data" }` object.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FrameImage {
    /// `data:<mime>;base64,<payload>`.
    DataUrl(String),
    /// Separate blob with its MIME type.
    Blob(EncodedStill),
}

impl FrameImage {
    /// Decode back to the encoded still image bytes.
    pub fn to_still(&self) -> GifDocResult<EncodedStill> {
        match self {
            Self::Blob(still) => Ok(still.clone()),
            Self::DataUrl(url) => parse_data_url(url),
        }
    }
}

fn parse_data_url(url: &str) -> GifDocResult<EncodedStill> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| GifDocError::decode("frame image is not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| GifDocError::decode("data URL has no payload separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| GifDocError::decode("data URL is not base64-encoded"))?;
    let format = StillFormat::from_mime(mime)
        .ok_or_else(|| GifDocError::decode(format!("unsupported data URL mime '{mime}'")))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| GifDocError::decode(format!("data URL payload: {e}")))?;
    Ok(EncodedStill { format, bytes })
}

/// One decoded and re-encoded frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRecord {
    /// 0-based position in emission order.
    pub index: u32,
    /// Display time in milliseconds (defaulted when the container declares none).
    pub delay: u32,
    /// Re-encoded patch.
    pub image: FrameImage,
    /// Patch width; may be smaller than the canvas.
    pub width: u32,
    /// Patch height; may be smaller than the canvas.
    pub height: u32,
    /// Left offset of the patch within the canvas.
    pub x: u32,
    /// Top offset of the patch within the canvas.
    pub y: u32,
    /// Disposal method, serialized as its numeric code.
    pub disposal: Disposal,
}

/// Where a document came from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentMetadata {
    /// Input size in bytes.
    pub size: u64,
    /// When the document was assembled.
    pub created: DateTime<Utc>,
    /// Container signature, e.g. `GIF89a`.
    pub format: String,
    /// Original file name.
    pub filename: String,
}

/// The result of one conversion.
///
/// Immutable once assembled: fields are only reachable through accessors and frames are handed
/// out as a shared slice.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDocument {
    width: u32,
    height: u32,
    frame_count: u32,
    duration: u64,
    loop_count: u32,
    frames: Vec<FrameRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<DocumentMetadata>,
}

impl AnimationDocument {
    pub(crate) fn assemble(
        width: u32,
        height: u32,
        duration: u64,
        loop_count: u32,
        frames: Vec<FrameRecord>,
        metadata: Option<DocumentMetadata>,
    ) -> Self {
        Self {
            width,
            height,
            frame_count: frames.len() as u32,
            duration,
            loop_count,
            frames,
            metadata,
        }
    }

    /// Parse a document previously written as JSON.
    pub fn from_reader<R: Read>(r: R) -> GifDocResult<Self> {
        let doc: Self = serde_json::from_reader(r)
            .map_err(|e| GifDocError::decode(format!("parse animation document JSON: {e}")))?;
        if doc.frame_count as usize != doc.frames.len() {
            return Err(GifDocError::decode(format!(
                "document declares {} frames but contains {}",
                doc.frame_count,
                doc.frames.len()
            )));
        }
        Ok(doc)
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Total play time of one loop, in milliseconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Declared loop count; `0` means infinite or unknown.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Frames in display order.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Source metadata, when requested.
    pub fn metadata(&self) -> Option<&DocumentMetadata> {
        self.metadata.as_ref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
