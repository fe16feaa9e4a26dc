use thiserror::Error;

use lambda_core::{CoreError, TransportError, ValidationError};
use lambda_model::ModelError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("function gateway responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("`{function}` lambda function has no http port")]
    MissingPort { function: String },

    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

impl From<GatewayError> for CoreError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Http(e) => classify(e).into(),
            GatewayError::Status { status, body } => TransportError::Upstream { status, body }.into(),
            GatewayError::MissingPort { function } => ValidationError::Model(
                ModelError::InvalidDescriptor(format!("`{function}` has no http port")),
            )
            .into(),
            GatewayError::InvalidConfig(msg) => CoreError::Internal(msg),
        }
    }
}

/// Map a client error onto the transport taxonomy.
pub(crate) fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if let Some(status) = e.status() {
        TransportError::Upstream {
            status: status.as_u16(),
            body: e.to_string(),
        }
    } else if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}
