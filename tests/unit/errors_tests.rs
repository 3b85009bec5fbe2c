/*!
 * Tests for error types and conversions
 */

use rapidclip::errors::{AppError, AudioError, ConfigError, ProviderError, TimelineError};

#[test]
fn test_providerError_fromStatus_shouldMapAuthAndRateLimit() {
    assert!(matches!(ProviderError::from_status(401, "no".into()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(403, "no".into()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(429, "slow".into()), ProviderError::RateLimitExceeded(_)));
    assert!(matches!(
        ProviderError::from_status(500, "boom".into()),
        ProviderError::ApiError { status_code: 500, .. }
    ));
}

#[test]
fn test_appError_fromTypedErrors_shouldKeepVariant() {
    let error: AppError = ConfigError::InvalidMaxDuration(-1.0).into();
    assert!(matches!(error, AppError::Config(ConfigError::InvalidMaxDuration(_))));

    let error: AppError = TimelineError::ImageCountMismatch { expected: 2, actual: 1 }.into();
    assert_eq!(error.to_string(), "Timeline error: Expected 2 slot images, got 1");

    let error: AppError = AudioError::Decode("bad header".into()).into();
    assert!(matches!(error, AppError::Audio(AudioError::Decode(_))));
}

#[test]
fn test_appError_fromAnyhow_shouldBeUnknown() {
    let error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(error, AppError::Unknown(message) if message == "something odd"));
}
