use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("overflow: {0}")]
    Overflow(String),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CalcResult<T> = Result<T, CalcError>;

pub(crate) fn invalid(msg: impl Into<String>) -> CalcError {
    CalcError::InvalidInput(msg.into())
}
