use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Percentage out of range: {0}")]
    PercentOutOfRange(u32),
}
