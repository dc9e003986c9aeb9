// ============================================================================
// Engine Errors
// ============================================================================

use crate::numeric::NumericError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the matching core and its service boundary.
///
/// Cancelling an unknown or foreign order is not an error: it is reported as
/// `None` / `false` by the cancel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Ticker is not of the form `BASE/QUOTE` with two non-empty parts
    #[error("invalid market identifier `{0}`")]
    InvalidMarket(String),

    /// Caller violated a placement precondition
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// No reply arrived within the deadline; the request may still have been applied
    #[error("engine did not reply within {0:?}")]
    Timeout(Duration),

    /// The sequential processor is no longer running
    #[error("engine is not running")]
    Disconnected,

    #[error("failed to start engine thread: {0}")]
    Spawn(String),

    /// Reply kind does not match the request kind
    #[error("unexpected engine response: {0}")]
    UnexpectedResponse(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
