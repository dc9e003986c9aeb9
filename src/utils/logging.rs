// ============================================================================
// Logging Setup
// ============================================================================

use crate::error::{EngineError, EngineResult};
use tracing::Level;

/// Install a global `fmt` subscriber at `level`.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(level: Level) -> EngineResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .try_init()
        .map_err(|err| EngineError::Config(format!("logging: {err}")))
}
