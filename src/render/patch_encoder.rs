use crate::decode::container::FramePatch;
use crate::document::model::FrameImage;
use crate::foundation::config::OutputEncoding;
use crate::foundation::error::{GifDocError, GifDocResult};
use crate::render::surface_pool::RasterPool;
use base64::Engine as _;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

/// Still-image formats frames can be re-encoded to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StillFormat {
    /// Lossless PNG; quality is ignored.
    #[default]
    Png,
    /// Baseline JPEG; alpha is dropped.
    Jpeg,
    /// Lossless WebP; quality is ignored.
    WebpLossless,
}

impl StillFormat {
    /// MIME type written into data URLs and blobs.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebpLossless => "image/webp",
        }
    }

    /// File extension used by archive export.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebpLossless => "webp",
        }
    }

    /// Inverse of [`StillFormat::mime`].
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebpLossless),
            _ => None,
        }
    }

    /// Whether decoding the output reproduces the input pixels exactly.
    pub fn is_lossless(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

/// Encoded still image plus its format tag.
///
/// Serialized as `{ "mime": "image/png", "data": "<base64>" }`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncodedStill {
    /// Format of `bytes`.
    #[serde(rename = "mime", with = "mime_tag")]
    pub format: StillFormat,
    /// Complete, independently decodable image file.
    #[serde(rename = "data", with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

mod mime_tag {
    use super::StillFormat;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(f: &StillFormat, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(f.mime())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<StillFormat, D::Error> {
        let mime = String::deserialize(d)?;
        StillFormat::from_mime(&mime)
            .ok_or_else(|| D::Error::custom(format!("unsupported image mime '{mime}'")))
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)
    }
}

impl EncodedStill {
    /// `data:<mime>;base64,<payload>` form.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Still-image encoding collaborator: serializes one surface at a given quality.
pub trait StillEncoder: Send {
    /// Encode `surface`. `quality` is within `0.0..=1.0`.
    fn encode(&self, surface: &RgbaImage, quality: f32) -> GifDocResult<EncodedStill>;
}

/// [`StillEncoder`] backed by the `image` crate codecs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageStillEncoder {
    format: StillFormat,
}

impl ImageStillEncoder {
    /// Create an encoder producing `format`.
    pub fn new(format: StillFormat) -> Self {
        Self { format }
    }
}

fn jpeg_quality(quality: f32) -> u8 {
    ((quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1)
}

impl StillEncoder for ImageStillEncoder {
    fn encode(&self, surface: &RgbaImage, quality: f32) -> GifDocResult<EncodedStill> {
        let (w, h) = surface.dimensions();
        if w == 0 || h == 0 {
            return Err(GifDocError::encode(format!(
                "cannot encode an empty {w}x{h} surface"
            )));
        }

        let mut bytes = Vec::new();
        let res = match self.format {
            StillFormat::Png => PngEncoder::new(&mut bytes).write_image(
                surface.as_raw(),
                w,
                h,
                ExtendedColorType::Rgba8,
            ),
            StillFormat::Jpeg => {
                let rgb: RgbImage = surface.convert();
                JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality)).write_image(
                    rgb.as_raw(),
                    w,
                    h,
                    ExtendedColorType::Rgb8,
                )
            }
            StillFormat::WebpLossless => WebPEncoder::new_lossless(&mut bytes).write_image(
                surface.as_raw(),
                w,
                h,
                ExtendedColorType::Rgba8,
            ),
        };
        res.map_err(|e| {
            GifDocError::encode(format!("{} encode of {w}x{h} surface: {e}", self.format.mime()))
        })?;

        Ok(EncodedStill {
            format: self.format,
            bytes,
        })
    }
}

/// Rasterizes one frame patch into a pooled surface and re-encodes it.
pub struct FramePatchEncoder {
    encoder: Box<dyn StillEncoder>,
}

impl FramePatchEncoder {
    /// Wrap a still-image encoding collaborator.
    pub fn new(encoder: Box<dyn StillEncoder>) -> Self {
        Self { encoder }
    }

    /// Encode `patch` into a self-contained [`FrameImage`].
    pub fn encode(
        &self,
        pool: &mut RasterPool,
        patch: &FramePatch,
        quality: f32,
        output: OutputEncoding,
    ) -> GifDocResult<FrameImage> {
        let expected = (patch.width as usize)
            .saturating_mul(patch.height as usize)
            .saturating_mul(4);
        if patch.rgba.len() != expected {
            return Err(GifDocError::encode(format!(
                "patch {}x{} carries {} bytes, expected {expected}",
                patch.width,
                patch.height,
                patch.rgba.len()
            )));
        }

        let mut lease = pool.acquire(patch.width, patch.height);
        let dst: &mut [u8] = &mut lease;
        dst.copy_from_slice(&patch.rgba);

        let still = self.encoder.encode(&lease, quality)?;
        Ok(match output {
            OutputEncoding::DataUrl => FrameImage::DataUrl(still.to_data_url()),
            OutputEncoding::Blob => FrameImage::Blob(still),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/patch_encoder.rs"]
mod tests;
