use lt_core::errors::{ErrorInfo, LtError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("detector", "NEXT100")
        .with_context("point", "x_0.y_0.z_-5")
}

#[test]
fn config_error_surface() {
    let err = LtError::Config(sample_info("unknown-detector", "not in catalog"));
    assert_eq!(err.info().code, "unknown-detector");
    assert!(err.info().context.contains_key("detector"));
}

#[test]
fn baseline_error_surface() {
    let err = LtError::Baseline(sample_info("no-baseline-file", "first result missing"));
    assert_eq!(err.info().code, "no-baseline-file");
    assert!(err.to_string().starts_with("baseline error: first result missing"));
}

#[test]
fn display_lists_context_and_hint() {
    let err = LtError::Store(
        ErrorInfo::new("store-open", "cannot open store")
            .with_context("path", "/tmp/x")
            .with_hint("check permissions"),
    );
    assert_eq!(
        err.to_string(),
        "store error: cannot open store (code: store-open) | context: [path=/tmp/x] | hint: check permissions"
    );
}

#[test]
fn errors_round_trip_json() {
    let err = LtError::invalid_pitch("pitch_x must be equal to pitch_y");
    let json = serde_json::to_string(&err).expect("encode");
    let back: LtError = serde_json::from_str(&json).expect("decode");
    assert_eq!(err, back);
}
