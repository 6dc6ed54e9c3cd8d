//! Error types for the Apple Music provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Apple Music API errors
#[derive(Error, Debug)]
pub enum AppleMusicApiError {
    /// Developer token rejected or user token missing/expired
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// `/v1/me` endpoints need a music user token
    #[error("Music user token is not available")]
    MissingUserToken,

    /// API request returned an error
    #[error("Apple Music API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Apple Music operations
pub type Result<T> = std::result::Result<T, AppleMusicApiError>;

impl From<AppleMusicApiError> for BridgeError {
    fn from(error: AppleMusicApiError) -> Self {
        match error {
            AppleMusicApiError::NotFound { resource } => BridgeError::NotFound(resource),
            AppleMusicApiError::MissingUserToken => {
                BridgeError::NotAvailable("Music user token is not available".to_string())
            }
            AppleMusicApiError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppleMusicApiError::ApiError {
            status_code: 500,
            message: "Upstream failure".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Apple Music API error (status 500): Upstream failure"
        );
    }

    #[test]
    fn test_not_found_maps_to_bridge_not_found() {
        let error = AppleMusicApiError::NotFound {
            resource: "songs/1".to_string(),
        };
        let bridge_error: BridgeError = error.into();

        assert!(bridge_error.is_not_found());
    }

    #[test]
    fn test_error_conversion() {
        let error = AppleMusicApiError::AuthenticationFailed("Token expired".to_string());
        let bridge_error: BridgeError = error.into();

        assert!(matches!(bridge_error, BridgeError::OperationFailed(_)));
    }
}
