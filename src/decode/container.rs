use crate::foundation::core::Disposal;
use crate::foundation::error::GifDocResult;

/// One decompressed frame region as emitted by a container decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePatch {
    /// Patch width in pixels.
    pub width: u32,
    /// Patch height in pixels.
    pub height: u32,
    /// Horizontal offset within the canvas.
    pub left: u32,
    /// Vertical offset within the canvas.
    pub top: u32,
    /// Delay in milliseconds; `0` when the container declares none.
    pub delay_ms: u32,
    /// Disposal method, already translated from the raw container code.
    pub disposal: Disposal,
    /// Straight-alpha RGBA8, row-major, tightly packed (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

/// Logical screen plus every frame patch, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedContainer {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Declared loop count; `0` when absent or infinite.
    pub loop_count: u32,
    /// Frame patches in emission order.
    pub patches: Vec<FramePatch>,
}

impl DecodedContainer {
    /// Number of frame patches.
    pub fn frame_count(&self) -> usize {
        self.patches.len()
    }
}

/// Ceilings a decoder may enforce while it reads, before pixel data is expanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of frame patches.
    pub max_frames: u32,
    /// Maximum width and height of the logical screen and of every patch.
    pub max_dimension: u32,
}

impl DecodeLimits {
    /// No ceilings.
    pub const UNBOUNDED: Self = Self {
        max_frames: u32::MAX,
        max_dimension: u32::MAX,
    };
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Turns a raw container byte buffer into a [`DecodedContainer`].
///
/// Implementations are pure functions of their input. A malformed buffer must produce
/// [`crate::GifDocError::Decode`]; the converter never retries.
pub trait ContainerDecoder: Send {
    /// Decode the whole container.
    fn decode(&self, bytes: &[u8]) -> GifDocResult<DecodedContainer>;

    /// Decode, stopping with [`crate::GifDocError::LimitExceeded`] as soon as a ceiling is crossed.
    ///
    /// The default decodes everything and leaves the checks to the caller.
    fn decode_within(
        &self,
        bytes: &[u8],
        _limits: &DecodeLimits,
    ) -> GifDocResult<DecodedContainer> {
        self.decode(bytes)
    }
}
