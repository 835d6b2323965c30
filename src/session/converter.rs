use crate::decode::container::{ContainerDecoder, DecodeLimits, DecodedContainer};
use crate::decode::gif_container::GifContainerDecoder;
use crate::document::model::{AnimationDocument, DocumentMetadata, FrameRecord};
use crate::foundation::config::{ConvertOptions, ConverterConfig};
use crate::foundation::core::effective_delay;
use crate::foundation::error::{GifDocError, GifDocResult, LimitViolation, ValidationIssue};
use crate::input::validate::{ConversionInput, InputValidator};
use crate::render::patch_encoder::{FramePatchEncoder, ImageStillEncoder, StillEncoder};
use crate::render::surface_pool::{RasterPool, RasterPoolStats};
use crate::session::perf::{PerfMonitor, PerfSummary};
use std::time::{Duration, Instant};

/// Pipeline stage of the most recent conversion.
///
/// `Done` and `Failed` are terminal for that conversion; the next call to
/// [`Converter::convert`] starts over from `Validating`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConversionState {
    /// No conversion has run yet.
    #[default]
    Idle,
    /// Checking media type, size, signature and options.
    Validating,
    /// Running the container decoder and ceiling checks.
    Decoding,
    /// Re-encoding frame patches.
    EncodingFrames,
    /// Building the document.
    Assembling,
    /// Document returned.
    Done,
    /// Conversion aborted; nothing was returned but the error.
    Failed,
}

/// The conversion pipeline: validate, decode, encode every frame, assemble.
///
/// A converter owns its raster pool, so it must be driven by one caller at a time. Use
/// [`crate::ConversionQueue`] to share one converter between many requests.
pub struct Converter {
    config: ConverterConfig,
    validator: InputValidator,
    decoder: Box<dyn ContainerDecoder>,
    encoder: FramePatchEncoder,
    pool: RasterPool,
    perf: PerfMonitor,
    state: ConversionState,
    last_summary: Option<PerfSummary>,
}

impl Converter {
    /// Converter using the built-in GIF decoder and `image`-backed still encoder.
    pub fn new(config: ConverterConfig) -> GifDocResult<Self> {
        let encoder = ImageStillEncoder::new(config.still_format);
        Self::with_collaborators(config, Box::new(GifContainerDecoder::new()), Box::new(encoder))
    }

    /// Converter with caller-supplied decoder and still encoder.
    pub fn with_collaborators(
        config: ConverterConfig,
        decoder: Box<dyn ContainerDecoder>,
        encoder: Box<dyn StillEncoder>,
    ) -> GifDocResult<Self> {
        config.validate()?;
        Ok(Self {
            validator: InputValidator::new(config.limits),
            pool: RasterPool::new(config.pool_max_sizes),
            perf: PerfMonitor::new(Duration::from_millis(config.slow_frame_threshold_ms)),
            encoder: FramePatchEncoder::new(encoder),
            decoder,
            config,
            state: ConversionState::Idle,
            last_summary: None,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Stage reached by the most recent conversion.
    pub fn state(&self) -> ConversionState {
        self.state
    }

    /// Raster pool counters, accumulated across conversions.
    pub fn pool_stats(&self) -> RasterPoolStats {
        self.pool.stats()
    }

    /// Performance summary of the most recent successful conversion.
    pub fn last_summary(&self) -> Option<&PerfSummary> {
        self.last_summary.as_ref()
    }

    /// Run one conversion to completion or failure. Nothing is retried.
    #[tracing::instrument(skip_all, fields(file = %input.filename, bytes = input.bytes.len()))]
    pub fn convert(
        &mut self,
        input: &ConversionInput,
        opts: &ConvertOptions,
    ) -> GifDocResult<AnimationDocument> {
        let res = self.run(input, opts);
        match &res {
            Ok(_) => self.transition(ConversionState::Done),
            Err(e) => {
                tracing::debug!(stage = ?self.state, error = %e, "conversion failed");
                self.transition(ConversionState::Failed);
            }
        }
        res
    }

    fn transition(&mut self, next: ConversionState) {
        tracing::debug!(from = ?self.state, to = ?next, "conversion state");
        self.state = next;
    }

    fn run(
        &mut self,
        input: &ConversionInput,
        opts: &ConvertOptions,
    ) -> GifDocResult<AnimationDocument> {
        self.perf.start();

        self.transition(ConversionState::Validating);
        let validation = self.validator.validate(input)?;
        for warning in &validation.warnings {
            tracing::warn!(file = %input.filename, "{warning}");
        }
        if !(0.0..=1.0).contains(&opts.quality) {
            return Err(ValidationIssue::InvalidQuality(opts.quality).into());
        }

        self.transition(ConversionState::Decoding);
        let limits = DecodeLimits {
            max_frames: opts.effective_max_frames(&self.config.limits),
            max_dimension: self.config.limits.max_dimension,
        };
        let container = self.decoder.decode_within(&input.bytes, &limits)?;
        check_limits(&container, &limits)?;

        self.transition(ConversionState::EncodingFrames);
        let DecodedContainer {
            width,
            height,
            loop_count,
            patches,
            ..
        } = container;
        let default_delay = self.config.default_delay_ms;
        let high_water = self.config.pool_release_high_water;
        let mut frames = Vec::with_capacity(patches.len());
        let mut duration: u64 = 0;
        let mut released = false;

        for (index, patch) in patches.into_iter().enumerate() {
            let t0 = Instant::now();
            let image = self
                .encoder
                .encode(&mut self.pool, &patch, opts.quality, opts.output)?;
            self.perf.record_frame(t0.elapsed());

            let delay = effective_delay(patch.delay_ms, default_delay);
            duration += u64::from(delay.max(default_delay));
            frames.push(FrameRecord {
                index: index as u32,
                delay,
                image,
                width: patch.width,
                height: patch.height,
                x: patch.left,
                y: patch.top,
                disposal: patch.disposal,
            });

            if !released && high_water > 0 && frames.len() >= high_water {
                self.pool.release_all();
                released = true;
                tracing::debug!(frames = frames.len(), "released raster pool at high-water mark");
            }
        }

        self.transition(ConversionState::Assembling);
        let metadata = opts.include_metadata.then(|| DocumentMetadata {
            size: input.size(),
            created: chrono::Utc::now(),
            format: input.signature().unwrap_or("GIF").to_string(),
            filename: input.filename.clone(),
        });
        let doc = AnimationDocument::assemble(width, height, duration, loop_count, frames, metadata);

        let summary = self
            .perf
            .finish(input.size(), doc.frames().len(), (width, height));
        summary.log();
        self.last_summary = Some(summary);
        Ok(doc)
    }
}

/// Re-checks the ceilings for decoders that do not enforce them while reading.
fn check_limits(container: &DecodedContainer, limits: &DecodeLimits) -> GifDocResult<()> {
    if container.width == 0 || container.height == 0 {
        return Err(GifDocError::decode(format!(
            "logical screen is empty ({}x{})",
            container.width, container.height
        )));
    }

    if container.frame_count() > limits.max_frames as usize {
        return Err(LimitViolation::TooManyFrames {
            count: container.frame_count(),
            max: limits.max_frames,
        }
        .into());
    }

    let max_dim = limits.max_dimension;
    if container.width > max_dim || container.height > max_dim {
        return Err(LimitViolation::DimensionsTooLarge {
            width: container.width,
            height: container.height,
            max: max_dim,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/converter.rs"]
mod tests;
