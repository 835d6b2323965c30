use super::*;
use crate::decode::container::FramePatch;
use crate::document::model::FrameImage;
use crate::foundation::config::{Limits, OutputEncoding};
use crate::foundation::core::Disposal;
use crate::render::patch_encoder::{EncodedStill, StillFormat};
use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct StubDecoder(DecodedContainer);

impl ContainerDecoder for StubDecoder {
    fn decode(&self, _bytes: &[u8]) -> GifDocResult<DecodedContainer> {
        Ok(self.0.clone())
    }
}

/// Records the ceilings handed to the decoder.
struct LimitRecordingDecoder {
    decoded: DecodedContainer,
    seen: Arc<parking_lot::Mutex<Option<DecodeLimits>>>,
}

impl ContainerDecoder for LimitRecordingDecoder {
    fn decode(&self, _bytes: &[u8]) -> GifDocResult<DecodedContainer> {
        Ok(self.decoded.clone())
    }

    fn decode_within(
        &self,
        bytes: &[u8],
        limits: &DecodeLimits,
    ) -> GifDocResult<DecodedContainer> {
        *self.seen.lock() = Some(*limits);
        self.decode(bytes)
    }
}

struct FailingDecoder;

impl ContainerDecoder for FailingDecoder {
    fn decode(&self, _bytes: &[u8]) -> GifDocResult<DecodedContainer> {
        Err(GifDocError::decode("bad block"))
    }
}

#[derive(Clone, Default)]
struct CountingEncoder {
    calls: Arc<AtomicUsize>,
    fail_on_call: Option<usize>,
}

impl StillEncoder for CountingEncoder {
    fn encode(&self, surface: &RgbaImage, _quality: f32) -> GifDocResult<EncodedStill> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(n) {
            return Err(GifDocError::encode("stub refused"));
        }
        Ok(EncodedStill {
            format: StillFormat::Png,
            bytes: surface.as_raw().clone(),
        })
    }
}

fn patch(width: u32, height: u32, delay_ms: u32) -> FramePatch {
    FramePatch {
        width,
        height,
        left: 1,
        top: 2,
        delay_ms,
        disposal: Disposal::DoNotDispose,
        rgba: vec![7; (width * height * 4) as usize],
    }
}

fn container(width: u32, height: u32, delays: &[u32]) -> DecodedContainer {
    DecodedContainer {
        width,
        height,
        loop_count: 0,
        patches: delays.iter().map(|&d| patch(width, height, d)).collect(),
    }
}

fn input() -> ConversionInput {
    ConversionInput::new(b"GIF89a-stub".to_vec(), "image/gif", "stub.gif")
}

fn converter(
    config: ConverterConfig,
    decoded: DecodedContainer,
    encoder: CountingEncoder,
) -> Converter {
    Converter::with_collaborators(config, Box::new(StubDecoder(decoded)), Box::new(encoder))
        .unwrap()
}

#[test]
fn default_delay_is_substituted_and_summed() {
    let enc = CountingEncoder::default();
    let mut c = converter(
        ConverterConfig::default(),
        container(10, 10, &[0, 150, 200]),
        enc.clone(),
    );

    let doc = c.convert(&input(), &ConvertOptions::default()).unwrap();
    assert_eq!(doc.duration(), 450);
    assert_eq!(doc.frame_count(), 3);
    assert_eq!(doc.frames().len(), 3);
    let delays: Vec<u32> = doc.frames().iter().map(|f| f.delay).collect();
    assert_eq!(delays, vec![100, 150, 200]);
    let indices: Vec<u32> = doc.frames().iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(enc.calls.load(Ordering::SeqCst), 3);
    assert_eq!(c.state(), ConversionState::Done);
}

#[test]
fn short_delays_count_as_default_in_duration() {
    let mut c = converter(
        ConverterConfig::default(),
        container(4, 4, &[50, 300]),
        CountingEncoder::default(),
    );
    let doc = c.convert(&input(), &ConvertOptions::default()).unwrap();
    assert_eq!(doc.frames()[0].delay, 50);
    let expected: u64 = doc
        .frames()
        .iter()
        .map(|f| u64::from(f.delay.max(100)))
        .sum();
    assert_eq!(doc.duration(), expected);
    assert_eq!(doc.duration(), 400);
}

#[test]
fn frame_records_carry_patch_geometry() {
    let mut c = converter(
        ConverterConfig::default(),
        container(3, 2, &[10]),
        CountingEncoder::default(),
    );
    let opts = ConvertOptions {
        output: OutputEncoding::Blob,
        ..ConvertOptions::default()
    };
    let doc = c.convert(&input(), &opts).unwrap();
    let f = &doc.frames()[0];
    assert_eq!((f.width, f.height, f.x, f.y), (3, 2, 1, 2));
    assert_eq!(f.disposal, Disposal::DoNotDispose);
    match &f.image {
        FrameImage::Blob(still) => assert_eq!(still.bytes, vec![7; 3 * 2 * 4]),
        other => panic!("expected blob, got {other:?}"),
    }
    assert_eq!((doc.width(), doc.height()), (3, 2));
}

#[test]
fn too_many_frames_fails_without_encoding() {
    let enc = CountingEncoder::default();
    let cfg = ConverterConfig {
        limits: Limits {
            max_frames: 2,
            ..Limits::default()
        },
        ..ConverterConfig::default()
    };
    let mut c = converter(cfg, container(4, 4, &[10, 10, 10]), enc.clone());

    let err = c.convert(&input(), &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        GifDocError::LimitExceeded(LimitViolation::TooManyFrames { count: 3, max: 2 })
    ));
    assert_eq!(enc.calls.load(Ordering::SeqCst), 0);
    assert_eq!(c.state(), ConversionState::Failed);
}

#[test]
fn request_frame_cap_applies() {
    let enc = CountingEncoder::default();
    let mut c = converter(
        ConverterConfig::default(),
        container(4, 4, &[10, 10, 10]),
        enc.clone(),
    );
    let opts = ConvertOptions {
        max_frames: Some(1),
        ..ConvertOptions::default()
    };
    let err = c.convert(&input(), &opts).unwrap_err();
    assert!(err.is_limit_exceeded());
    assert_eq!(enc.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn oversized_canvas_fails_before_pool_use() {
    let cfg = ConverterConfig {
        limits: Limits {
            max_dimension: 8,
            ..Limits::default()
        },
        ..ConverterConfig::default()
    };
    let mut c = converter(cfg, container(9, 4, &[10]), CountingEncoder::default());

    let err = c.convert(&input(), &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        GifDocError::LimitExceeded(LimitViolation::DimensionsTooLarge { width: 9, .. })
    ));
    assert_eq!(c.pool_stats().acquisitions, 0);
}

#[test]
fn decode_failure_is_terminal() {
    let mut c = Converter::with_collaborators(
        ConverterConfig::default(),
        Box::new(FailingDecoder),
        Box::new(CountingEncoder::default()),
    )
    .unwrap();
    let err = c.convert(&input(), &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, GifDocError::Decode(_)));
    assert_eq!(c.state(), ConversionState::Failed);
    assert!(c.last_summary().is_none());
}

#[test]
fn encode_failure_aborts_the_whole_document() {
    let enc = CountingEncoder {
        fail_on_call: Some(1),
        ..CountingEncoder::default()
    };
    let mut c = converter(
        ConverterConfig::default(),
        container(4, 4, &[10, 10, 10]),
        enc.clone(),
    );
    let err = c.convert(&input(), &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, GifDocError::Encode(_)));
    assert_eq!(enc.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn validation_runs_before_decoding() {
    let enc = CountingEncoder::default();
    let mut c = converter(ConverterConfig::default(), container(4, 4, &[10]), enc.clone());
    let mut bad = input();
    bad.media_type = "video/mp4".to_string();

    let err = c.convert(&bad, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        GifDocError::Validation(ValidationIssue::WrongMediaType { .. })
    ));
    assert_eq!(enc.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn out_of_range_quality_is_rejected() {
    let mut c = converter(
        ConverterConfig::default(),
        container(4, 4, &[10]),
        CountingEncoder::default(),
    );
    for q in [-0.1, 1.5, f32::NAN] {
        let opts = ConvertOptions {
            quality: q,
            ..ConvertOptions::default()
        };
        let err = c.convert(&input(), &opts).unwrap_err();
        assert!(matches!(
            err,
            GifDocError::Validation(ValidationIssue::InvalidQuality(_))
        ));
    }
}

#[test]
fn pool_is_released_once_at_high_water() {
    let cfg = ConverterConfig {
        pool_release_high_water: 2,
        ..ConverterConfig::default()
    };
    let mut c = converter(cfg, container(4, 4, &[10, 10, 10, 10]), CountingEncoder::default());
    c.convert(&input(), &ConvertOptions::default()).unwrap();

    let st = c.pool_stats();
    assert_eq!(st.releases, 1);
    assert_eq!(st.acquisitions, 4);
    // Re-registered after the release.
    assert_eq!(st.alloc_surfaces, 2);
}

#[test]
fn metadata_is_optional() {
    let mut c = converter(
        ConverterConfig::default(),
        container(4, 4, &[10]),
        CountingEncoder::default(),
    );
    let doc = c.convert(&input(), &ConvertOptions::default()).unwrap();
    let meta = doc.metadata().unwrap();
    assert_eq!(meta.filename, "stub.gif");
    assert_eq!(meta.format, "GIF89a");
    assert_eq!(meta.size, 11);

    let opts = ConvertOptions {
        include_metadata: false,
        ..ConvertOptions::default()
    };
    let doc = c.convert(&input(), &opts).unwrap();
    assert!(doc.metadata().is_none());
    assert_eq!(c.last_summary().unwrap().frame_count, 1);
}

#[test]
fn decoder_receives_the_effective_ceilings() {
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let decoder = LimitRecordingDecoder {
        decoded: container(4, 4, &[10]),
        seen: Arc::clone(&seen),
    };
    let cfg = ConverterConfig {
        limits: Limits {
            max_frames: 40,
            max_dimension: 512,
            ..Limits::default()
        },
        ..ConverterConfig::default()
    };
    let mut c = Converter::with_collaborators(
        cfg,
        Box::new(decoder),
        Box::new(CountingEncoder::default()),
    )
    .unwrap();
    let opts = ConvertOptions {
        max_frames: Some(7),
        ..ConvertOptions::default()
    };
    c.convert(&input(), &opts).unwrap();

    assert_eq!(
        *seen.lock(),
        Some(DecodeLimits {
            max_frames: 7,
            max_dimension: 512,
        })
    );
}

#[test]
fn decoder_limit_errors_pass_through() {
    let enc = CountingEncoder::default();
    let cfg = ConverterConfig {
        limits: Limits {
            max_frames: 1,
            ..Limits::default()
        },
        ..ConverterConfig::default()
    };
    let mut c = Converter::with_collaborators(
        cfg,
        Box::new(GifContainerDecoder::new()),
        Box::new(enc.clone()),
    )
    .unwrap();

    let mut bytes = Vec::new();
    {
        let mut gif_enc = gif::Encoder::new(&mut bytes, 4, 4, &[]).unwrap();
        for _ in 0..3 {
            let mut px = [5u8, 6, 7, 255].repeat(16);
            gif_enc
                .write_frame(&gif::Frame::from_rgba(4, 4, &mut px))
                .unwrap();
        }
    }
    let gif_input = ConversionInput::new(bytes, "image/gif", "three.gif");

    let err = c.convert(&gif_input, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        GifDocError::LimitExceeded(LimitViolation::TooManyFrames { count: 2, max: 1 })
    ));
    assert_eq!(enc.calls.load(Ordering::SeqCst), 0);
}
