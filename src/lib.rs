//! gifdoc converts animated GIFs into portable, JSON-shaped animation documents.
//!
//! Each frame patch is decoded, re-encoded as a self-contained still image (PNG, JPEG or lossless
//! WebP, embedded as a data URL or a separate blob), and described together with its timing,
//! placement and disposal method. The resulting [`AnimationDocument`] is enough for an unrelated
//! playback engine to reconstruct the animation.
//!
//! # Pipeline overview
//!
//! 1. **Validate**: media type, size ceiling and GIF signature ([`InputValidator`])
//! 2. **Decode**: container bytes to frame patches ([`ContainerDecoder`])
//! 3. **Encode**: every patch through a pooled surface into a still image ([`FramePatchEncoder`])
//! 4. **Assemble**: an immutable [`AnimationDocument`]
//!
//! [`Converter`] drives one conversion at a time. [`ConversionQueue`] serializes many requests
//! onto a single converter so that peak memory stays bounded to one job.
//!
//! Frames are not composited: each record holds only the patch the container emitted. Applying
//! disposal methods is left to the consumer of the document.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Container decoding boundary and the GIF decoder.
pub mod decode;
/// Document model and exporters.
pub mod document;
/// Conversion inputs and validation.
pub mod input;
/// Surface pooling and still-image encoding.
pub mod render;
/// Converter, diagnostics and job queue.
pub mod session;

pub use crate::decode::container::{ContainerDecoder, DecodeLimits, DecodedContainer, FramePatch};
pub use crate::decode::gif_container::GifContainerDecoder;
pub use crate::document::export::{
    ArchiveFrame, ArchiveManifest, MANIFEST_FILE_NAME, export_archive, to_json_string, write_json,
};
pub use crate::document::model::{AnimationDocument, DocumentMetadata, FrameImage, FrameRecord};
pub use crate::foundation::alloc_track::MemorySample;
pub use crate::foundation::config::{ConvertOptions, ConverterConfig, Limits, OutputEncoding};
pub use crate::foundation::core::{DEFAULT_FRAME_DELAY_MS, Disposal, effective_delay};
pub use crate::foundation::error::{GifDocError, GifDocResult, LimitViolation, ValidationIssue};
pub use crate::input::validate::{ConversionInput, GIF_MEDIA_TYPE, InputValidator, Validation};
pub use crate::render::patch_encoder::{
    EncodedStill, FramePatchEncoder, ImageStillEncoder, StillEncoder, StillFormat,
};
pub use crate::render::surface_pool::{RasterPool, RasterPoolStats, SurfaceLease};
pub use crate::session::converter::{ConversionState, Converter};
pub use crate::session::perf::{PerfMonitor, PerfSummary};
pub use crate::session::queue::{ConversionQueue, JobHandle, JobSummary, QueueStatus};

/// Convert one input with a fresh [`Converter`] built from `config`.
pub fn convert(
    input: &ConversionInput,
    opts: &ConvertOptions,
    config: ConverterConfig,
) -> GifDocResult<AnimationDocument> {
    Converter::new(config)?.convert(input, opts)
}
