//! Gateway errors

use thiserror::Error;
use tuition_common::TuitionError;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("gateway rejected request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("payment signature verification failed")]
    InvalidSignature,

    #[error("gateway misconfigured: {0}")]
    Config(String),

    #[error("unexpected gateway response: {0}")]
    Malformed(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Malformed(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<GatewayError> for TuitionError {
    fn from(err: GatewayError) -> Self {
        TuitionError::Gateway(err.to_string())
    }
}
