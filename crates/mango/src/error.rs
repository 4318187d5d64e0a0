use thiserror::Error;

use crate::ast::{ComparisonOp, LogicalOp};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operand kind: {0}")]
    InvalidOperandKind(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("invalid sort spec: {0}")]
    InvalidSort(String),

    /// Nesting exceeded the configured bound.
    #[error("condition nesting exceeds the limit of {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("`{0}` requires at least one operand")]
    EmptyOperands(LogicalOp),

    #[error("`{0}` comparison requires a field name")]
    MissingField(ComparisonOp),

    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[inline]
    pub fn operand_kind(msg: impl Into<String>) -> Self {
        Error::InvalidOperandKind(msg.into())
    }

    #[inline]
    pub fn condition(msg: impl Into<String>) -> Self {
        Error::InvalidCondition(msg.into())
    }

    /// True for the resource guard class of failures, as opposed to plain
    /// input validation.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Error::DepthExceeded { .. })
    }
}
