use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("`{function}` lambda function has non-unique labels")]
    DuplicateLabel { function: String, label: String },

    #[error("`{function}` lambda function has non-unique attributes for label {label}")]
    DuplicateAttribute {
        function: String,
        label: String,
        attribute: String,
    },

    #[error("unknown attribute input type: {0}")]
    UnknownInputType(String),

    #[error("unknown frame quality: {0}")]
    UnknownQuality(String),

    #[error("unknown job status: {0}")]
    UnknownJobStatus(String),

    #[error("unknown shape type: {0}")]
    UnknownShapeType(String),

    #[error("invalid function descriptor: {0}")]
    InvalidDescriptor(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
