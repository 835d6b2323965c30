use crate::decode::container::{ContainerDecoder, DecodeLimits, DecodedContainer, FramePatch};
use crate::foundation::core::Disposal;
use crate::foundation::error::{GifDocError, GifDocResult, LimitViolation};
use std::io::Cursor;

/// [`ContainerDecoder`] for GIF87a/GIF89a backed by the `gif` crate.
///
/// Frames are expanded to RGBA (local or global palette applied, transparent index mapped to
/// alpha 0) but are not composited: each patch covers only its own sub-rectangle.
#[derive(Clone, Copy, Debug, Default)]
pub struct GifContainerDecoder;

impl GifContainerDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self
    }
}

fn disposal_from_gif(method: gif::DisposalMethod) -> Disposal {
    match method {
        gif::DisposalMethod::Any => Disposal::Unspecified,
        gif::DisposalMethod::Keep => Disposal::DoNotDispose,
        gif::DisposalMethod::Background => Disposal::RestoreBackground,
        gif::DisposalMethod::Previous => Disposal::RestorePrevious,
    }
}

impl ContainerDecoder for GifContainerDecoder {
    fn decode(&self, bytes: &[u8]) -> GifDocResult<DecodedContainer> {
        self.decode_within(bytes, &DecodeLimits::UNBOUNDED)
    }

    /// Ceilings are enforced from frame headers, so an oversized screen or patch and the first
    /// frame past the cap are rejected before their pixels are decompressed.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    fn decode_within(
        &self,
        bytes: &[u8],
        limits: &DecodeLimits,
    ) -> GifDocResult<DecodedContainer> {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = opts
            .read_info(Cursor::new(bytes))
            .map_err(|e| GifDocError::decode(format!("read gif header: {e}")))?;

        let mut out = DecodedContainer {
            width: u32::from(decoder.width()),
            height: u32::from(decoder.height()),
            loop_count: 0,
            patches: Vec::new(),
        };
        if out.width == 0 || out.height == 0 {
            return Err(GifDocError::decode(format!(
                "logical screen is empty ({}x{})",
                out.width, out.height
            )));
        }
        check_dimensions(out.width, out.height, limits)?;

        loop {
            let index = out.patches.len();
            let Some(info) = decoder
                .next_frame_info()
                .map_err(|e| GifDocError::decode(format!("read frame {index}: {e}")))?
            else {
                break;
            };
            if index >= limits.max_frames as usize {
                return Err(LimitViolation::TooManyFrames {
                    count: index + 1,
                    max: limits.max_frames,
                }
                .into());
            }

            let mut patch = FramePatch {
                width: u32::from(info.width),
                height: u32::from(info.height),
                left: u32::from(info.left),
                top: u32::from(info.top),
                // GIF delays are in hundredths of a second.
                delay_ms: u32::from(info.delay) * 10,
                disposal: disposal_from_gif(info.dispose),
                rgba: Vec::new(),
            };
            check_dimensions(patch.width, patch.height, limits)?;

            patch.rgba = vec![0; decoder.buffer_size()];
            decoder
                .read_into_buffer(&mut patch.rgba)
                .map_err(|e| GifDocError::decode(format!("read frame {index}: {e}")))?;
            out.patches.push(patch);
        }

        // The NETSCAPE2.0 extension is only seen once frames have been read.
        out.loop_count = match decoder.repeat() {
            gif::Repeat::Infinite => 0,
            gif::Repeat::Finite(n) => u32::from(n),
        };

        tracing::debug!(
            width = out.width,
            height = out.height,
            frames = out.patches.len(),
            "decoded gif container"
        );
        Ok(out)
    }
}

fn check_dimensions(width: u32, height: u32, limits: &DecodeLimits) -> GifDocResult<()> {
    if width > limits.max_dimension || height > limits.max_dimension {
        return Err(LimitViolation::DimensionsTooLarge {
            width,
            height,
            max: limits.max_dimension,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/decode/gif_container.rs"]
mod tests;
