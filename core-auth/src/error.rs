use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid service configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Lifecycle observation unavailable: {0}")]
    LifecycleUnavailable(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
