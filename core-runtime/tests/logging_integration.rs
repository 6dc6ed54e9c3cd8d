//! Integration tests for logging system

use bridge_traits::logger::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_logging_configuration() {
    // Logging can only be initialized once per process, so the builder is
    // exercised separately from initialization.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_token_redaction(true)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.redact_tokens);
    assert!(config.enable_spans);
}

#[test]
fn test_token_redaction() {
    assert_eq!(
        redact_if_sensitive("developer_token", "eyJhbGciOiJFUzI1NiJ9"),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("music_user_token", "Ag8x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
}

#[test]
fn test_normal_values_pass_through() {
    assert_eq!(redact_if_sensitive("song_id", "1440857781"), "1440857781");
    assert_eq!(redact_if_sensitive("source", "previewClip"), "previewClip");
    assert_eq!(redact_if_sensitive("page", "3"), "3");
}

#[test]
fn test_init_rejects_invalid_filter_then_accepts_valid_one() {
    let invalid = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_filter("core_playback=notalevel");
    assert!(init_logging(invalid).is_err());

    let valid = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);
    assert!(init_logging(valid).is_ok());

    // A second initialization in the same process fails.
    let again = LoggingConfig::default().with_format(LogFormat::Compact);
    assert!(init_logging(again).is_err());
}
