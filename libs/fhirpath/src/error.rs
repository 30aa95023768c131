//! Error types for parsing and evaluation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FhirPathError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FhirPathError {
    #[error("Parse error: {message} at line {line}, column {column}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Unknown function: {0}")]
    FunctionNotFound(String),

    #[error("Unknown variable: {0}")]
    VariableNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl FhirPathError {
    pub fn parse(message: impl Into<String>, line: usize, column: usize) -> Self {
        FhirPathError::ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl From<aurum_format::FormatError> for FhirPathError {
    fn from(err: aurum_format::FormatError) -> Self {
        FhirPathError::InvalidResource(err.to_string())
    }
}
