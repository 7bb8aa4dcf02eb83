//! Identifier parsing errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
