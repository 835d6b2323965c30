/// Frame delay substituted when the container reports none (or zero).
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// How a frame's region is treated before the next frame is drawn.
///
/// Translated once from the decoder's raw code; serialized back as that code (`0..=3`) so that
/// documents stay interchangeable with playback engines that expect numeric disposal values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Disposal {
    /// No disposal specified (code 0, or any unknown code).
    #[default]
    Unspecified,
    /// Leave the frame in place (code 1).
    DoNotDispose,
    /// Clear the frame's region to the background (code 2).
    RestoreBackground,
    /// Restore the region to what it was before the frame (code 3).
    RestorePrevious,
}

impl Disposal {
    /// Translate a raw decoder code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::DoNotDispose,
            2 => Self::RestoreBackground,
            3 => Self::RestorePrevious,
            _ => Self::Unspecified,
        }
    }

    /// Raw numeric code as written into documents.
    pub fn code(self) -> u8 {
        match self {
            Self::Unspecified => 0,
            Self::DoNotDispose => 1,
            Self::RestoreBackground => 2,
            Self::RestorePrevious => 3,
        }
    }
}

impl From<u8> for Disposal {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<Disposal> for u8 {
    fn from(d: Disposal) -> Self {
        d.code()
    }
}

/// Substitute `default_ms` for a missing (zero) delay.
pub fn effective_delay(raw_ms: u32, default_ms: u32) -> u32 {
    if raw_ms == 0 { default_ms } else { raw_ms }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
