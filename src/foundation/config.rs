use crate::foundation::core::DEFAULT_FRAME_DELAY_MS;
use crate::foundation::error::{GifDocError, GifDocResult};
use crate::render::patch_encoder::StillFormat;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Externally supplied ceilings. Each one produces its own rejection reason when exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Inputs larger than this are rejected before decoding.
    pub max_input_bytes: u64,
    /// Inputs larger than this are accepted with a "may process slowly" warning.
    pub warn_input_bytes: u64,
    /// Maximum number of frames in one document.
    pub max_frames: u32,
    /// Maximum canvas width and height, in pixels.
    pub max_dimension: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_bytes: 50 * 1024 * 1024,
            warn_input_bytes: 10 * 1024 * 1024,
            max_frames: 1000,
            max_dimension: 4096,
        }
    }
}

/// Converter-wide configuration.
///
/// Loaded from JSON (every field optional) or built in code from [`Default`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Input and document ceilings.
    pub limits: Limits,
    /// Delay substituted for frames that report none.
    pub default_delay_ms: u32,
    /// Maximum number of distinct surface sizes the raster pool keeps alive.
    pub pool_max_sizes: usize,
    /// Frame count at which the pool is released once during a conversion.
    pub pool_release_high_water: usize,
    /// Average per-frame encode time above which a conversion is flagged as pathological.
    pub slow_frame_threshold_ms: u64,
    /// Still-image format frames are re-encoded to.
    pub still_format: StillFormat,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            default_delay_ms: DEFAULT_FRAME_DELAY_MS,
            pool_max_sizes: 5,
            pool_release_high_water: 50,
            slow_frame_threshold_ms: 250,
            still_format: StillFormat::Png,
        }
    }
}

impl ConverterConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> GifDocResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| GifDocError::config(format!("parse converter config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> GifDocResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            GifDocError::config(format!("open converter config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject configurations that could never accept an input.
    pub fn validate(&self) -> GifDocResult<()> {
        let l = &self.limits;
        if l.max_input_bytes == 0 {
            return Err(GifDocError::config("limits.max_input_bytes must be non-zero"));
        }
        if l.max_frames == 0 {
            return Err(GifDocError::config("limits.max_frames must be non-zero"));
        }
        if l.max_dimension == 0 {
            return Err(GifDocError::config("limits.max_dimension must be non-zero"));
        }
        if self.default_delay_ms == 0 {
            return Err(GifDocError::config("default_delay_ms must be non-zero"));
        }
        Ok(())
    }
}

/// How each frame's encoded image is embedded in the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEncoding {
    /// `data:<mime>;base64,...` string.
    #[default]
    DataUrl,
    /// Separate `{ mime, data }` blob.
    Blob,
}

/// Per-request processing options.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Frame image embedding.
    pub output: OutputEncoding,
    /// Encoder quality in `0.0..=1.0`; ignored by lossless formats.
    pub quality: f32,
    /// Per-request frame ceiling, combined with [`Limits::max_frames`] (the smaller wins).
    pub max_frames: Option<u32>,
    /// Attach [`crate::DocumentMetadata`] to the document.
    pub include_metadata: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output: OutputEncoding::DataUrl,
            quality: 0.92,
            max_frames: None,
            include_metadata: true,
        }
    }
}

impl ConvertOptions {
    /// Frame ceiling in effect for this request.
    pub fn effective_max_frames(&self, limits: &Limits) -> u32 {
        match self.max_frames {
            Some(m) => m.min(limits.max_frames),
            None => limits.max_frames,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
