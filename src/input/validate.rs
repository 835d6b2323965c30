use crate::foundation::config::Limits;
use crate::foundation::error::{GifDocError, GifDocResult, ValidationIssue};
use std::path::Path;
use std::sync::Arc;

/// The only media type accepted by the converter.
pub const GIF_MEDIA_TYPE: &str = "image/gif";

/// One uploaded file: its bytes plus the metadata the caller declared for it.
#[derive(Clone, Debug)]
pub struct ConversionInput {
    /// Raw container bytes. Shared so queued jobs can be cloned cheaply.
    pub bytes: Arc<[u8]>,
    /// Declared media type, e.g. `image/gif`.
    pub media_type: String,
    /// Original file name, recorded in document metadata.
    pub filename: String,
}

impl ConversionInput {
    /// Wrap in-memory bytes.
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    /// Read a file from disk; the media type is inferred from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> GifDocResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| GifDocError::io(format!("read input '{}': {e}", path.display())))?;
        let media_type = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gif") => GIF_MEDIA_TYPE,
            _ => "application/octet-stream",
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(bytes, media_type, filename))
    }

    /// Input size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The 6-byte container signature (`GIF87a` / `GIF89a`), if present.
    pub fn signature(&self) -> Option<&'static str> {
        match self.bytes.get(..6)? {
            b"GIF87a" => Some("GIF87a"),
            b"GIF89a" => Some("GIF89a"),
            _ => None,
        }
    }
}

/// Outcome of a successful validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validation {
    /// Advisory warnings; the input is still accepted.
    pub warnings: Vec<String>,
}

/// Cheap precondition checks run before any decode work.
#[derive(Clone, Copy, Debug)]
pub struct InputValidator {
    limits: Limits,
}

impl InputValidator {
    /// Create a validator for the given limits.
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Check declared media type, size, and signature.
    pub fn validate(&self, input: &ConversionInput) -> GifDocResult<Validation> {
        let declared = input.media_type.trim();
        if !declared.eq_ignore_ascii_case(GIF_MEDIA_TYPE) {
            return Err(ValidationIssue::WrongMediaType {
                declared: declared.to_string(),
            }
            .into());
        }

        let size = input.size();
        if size == 0 {
            return Err(ValidationIssue::Empty.into());
        }
        if size > self.limits.max_input_bytes {
            return Err(ValidationIssue::TooLarge {
                size,
                max: self.limits.max_input_bytes,
            }
            .into());
        }

        if input.signature().is_none() {
            return Err(ValidationIssue::NotGif.into());
        }

        let mut out = Validation::default();
        if size > self.limits.warn_input_bytes {
            out.warnings
                .push(format!("large file ({size} bytes) may process slowly"));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/validate.rs"]
mod tests;
