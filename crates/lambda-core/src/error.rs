use thiserror::Error;

use lambda_model::{FunctionKind, ModelError, TaskId};

/// Caller mistakes: always surfaced, never retried.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("`{function}` lambda function was called without mandatory argument: {name}")]
    MissingArgument { function: String, name: &'static str },

    #[error("the {description} is outside the job range")]
    OutOfRange {
        field: &'static str,
        description: &'static str,
    },

    #[error("`{function}` lambda function was run with wrong arguments (quality={quality})")]
    InvalidQuality { function: String, quality: String },

    #[error("job task id {job_task} does not match task id {task}")]
    TaskMismatch { task: TaskId, job_task: TaskId },

    #[error("`{function}` lambda function has incorrect type: {kind}")]
    UnsupportedKind { function: String, kind: FunctionKind },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Failures talking to an inference function.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("function responded with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed function response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("only one running request is allowed for the same task #{task}")]
    Conflict { task: TaskId },

    #[error("{0}")]
    NotFound(String),

    #[error("annotation store rejected data: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        CoreError::Validation(ValidationError::Model(e))
    }
}

impl CoreError {
    /// HTTP status a web layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Validation(ValidationError::UnsupportedKind { .. }) => 500,
            CoreError::Validation(ValidationError::Model(
                ModelError::DuplicateLabel { .. } | ModelError::DuplicateAttribute { .. },
            )) => 404,
            CoreError::Validation(_) => 400,
            CoreError::Transport(TransportError::Connect(_)) => 503,
            CoreError::Transport(TransportError::Timeout(_)) => 504,
            CoreError::Transport(TransportError::Upstream { status, .. }) => *status,
            CoreError::Transport(_) => 500,
            CoreError::Conflict { .. } => 409,
            CoreError::NotFound(_) => 404,
            CoreError::Store(_) | CoreError::Internal(_) => 500,
        }
    }

    /// Low-cardinality label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::Transport(TransportError::Connect(_)) => "connect",
            CoreError::Transport(TransportError::Timeout(_)) => "timeout",
            CoreError::Transport(TransportError::Upstream { .. }) => "upstream",
            CoreError::Transport(TransportError::Decode(_)) => "decode",
            CoreError::Transport(TransportError::Request(_)) => "request",
            CoreError::Conflict { .. } => "conflict",
            CoreError::NotFound(_) => "not_found",
            CoreError::Store(_) => "store",
            CoreError::Internal(_) => "internal",
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
