//! Error types for the element tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Duplicate field '{0}'")]
    DuplicateField(String),

    #[error("Choice field '{0}' has more than one populated variant")]
    DuplicateChoiceVariant(String),

    #[error("Cannot convert {from} to {to}")]
    ConversionFailed {
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid {to} value: {value}")]
    InvalidValue { to: &'static str, value: String },
}
