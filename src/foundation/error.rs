use std::fmt;

/// Result alias used throughout gifdoc.
pub type GifDocResult<T> = Result<T, GifDocError>;

/// Every way a conversion (or a queued conversion job) can fail.
///
/// Each variant carries a specific, human-readable reason so that callers can explain precisely
/// why a given file was rejected. All of them are terminal for the job that produced them.
#[derive(thiserror::Error, Debug)]
pub enum GifDocError {
    /// Input rejected before any decode work started.
    #[error("validation error: {0}")]
    Validation(ValidationIssue),

    /// The container could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Decoded container exceeds a configured ceiling.
    #[error("limit exceeded: {0}")]
    LimitExceeded(LimitViolation),

    /// A single frame could not be re-encoded; the whole conversion is aborted.
    #[error("encode error: {0}")]
    Encode(String),

    /// The job was still pending when the queue was cleared.
    #[error("queue cleared before the job started")]
    QueueCleared,

    /// Invalid converter configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure in input loading or exporting.
    #[error("io error: {0}")]
    Io(String),

    /// Anything else, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GifDocError {
    /// Build a [`GifDocError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`GifDocError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`GifDocError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`GifDocError::Io`].
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Return `true` for [`GifDocError::LimitExceeded`].
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded(_))
    }
}

impl From<ValidationIssue> for GifDocError {
    fn from(issue: ValidationIssue) -> Self {
        Self::Validation(issue)
    }
}

impl From<LimitViolation> for GifDocError {
    fn from(v: LimitViolation) -> Self {
        Self::LimitExceeded(v)
    }
}

/// Why an input was rejected by validation.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationIssue {
    /// Declared media type is not `image/gif`.
    WrongMediaType {
        /// The media type that was declared.
        declared: String,
    },
    /// Input is empty.
    Empty,
    /// Input exceeds the configured byte ceiling.
    TooLarge {
        /// Input size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        max: u64,
    },
    /// Bytes do not start with a GIF signature.
    NotGif,
    /// Quality outside `0.0..=1.0` (or not finite).
    InvalidQuality(f32),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongMediaType { declared } => {
                write!(f, "unsupported media type '{declared}', expected image/gif")
            }
            Self::Empty => f.write_str("input is empty"),
            Self::TooLarge { size, max } => {
                write!(f, "file too large: {size} bytes exceeds the {max} byte limit")
            }
            Self::NotGif => f.write_str("input does not start with a GIF87a/GIF89a signature"),
            Self::InvalidQuality(q) => write!(f, "quality {q} must be within 0.0..=1.0"),
        }
    }
}

/// Which configured ceiling a decoded container exceeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitViolation {
    /// More frames than the effective frame ceiling.
    TooManyFrames {
        /// Frames reported by the decoder.
        count: usize,
        /// Effective ceiling.
        max: u32,
    },
    /// Canvas larger than the dimension ceiling on either axis.
    DimensionsTooLarge {
        /// Canvas width.
        width: u32,
        /// Canvas height.
        height: u32,
        /// Configured ceiling per axis.
        max: u32,
    },
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyFrames { count, max } => {
                write!(f, "too many frames: {count} exceeds the {max} frame limit")
            }
            Self::DimensionsTooLarge { width, height, max } => write!(
                f,
                "dimensions too large: {width}x{height} exceeds the {max}px limit"
            ),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
