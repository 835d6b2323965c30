use super::*;

#[test]
fn partial_json_fills_defaults() {
    let json = r#"{ "limits": { "max_frames": 12 }, "still_format": "jpeg" }"#;
    let cfg = ConverterConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.limits.max_frames, 12);
    assert_eq!(cfg.limits.max_dimension, Limits::default().max_dimension);
    assert_eq!(cfg.default_delay_ms, 100);
    assert_eq!(cfg.still_format, StillFormat::Jpeg);
}

#[test]
fn zero_limits_are_rejected() {
    let json = r#"{ "limits": { "max_dimension": 0 } }"#;
    let err = ConverterConfig::from_reader(json.as_bytes()).unwrap_err();
    assert!(matches!(err, GifDocError::Config(_)));
    assert!(err.to_string().contains("max_dimension"));
}

#[test]
fn malformed_json_is_a_config_error() {
    let err = ConverterConfig::from_reader("{ nope".as_bytes()).unwrap_err();
    assert!(matches!(err, GifDocError::Config(_)));
}

#[test]
fn request_frame_cap_never_raises_the_configured_one() {
    let limits = Limits {
        max_frames: 10,
        ..Limits::default()
    };
    let mut opts = ConvertOptions::default();
    assert_eq!(opts.effective_max_frames(&limits), 10);
    opts.max_frames = Some(3);
    assert_eq!(opts.effective_max_frames(&limits), 3);
    opts.max_frames = Some(500);
    assert_eq!(opts.effective_max_frames(&limits), 10);
}
