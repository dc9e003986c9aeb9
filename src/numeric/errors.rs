// ============================================================================
// Numeric Errors
// Error types for decimal arithmetic and parsing
// ============================================================================

use thiserror::Error;

/// Errors that can occur during decimal arithmetic or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum NumericError {
    /// Result exceeded the representable decimal range
    #[error("arithmetic overflow: result exceeded maximum value")]
    Overflow,
    /// Input string could not be parsed as a decimal
    #[error("invalid input: could not parse `{0}` as a decimal")]
    InvalidInput(String),
}

/// Result type alias for numeric operations
pub type NumericResult<T> = Result<T, NumericError>;
