// ============================================================================
// Engine Configuration
// Markets, read-view limits and service boundary settings
// ============================================================================

use super::market::{default_markets, Market};
use crate::error::{EngineError, EngineResult};
use std::collections::HashSet;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of levels per side in depth responses
pub const DEFAULT_DEPTH_LEVELS: usize = 50;

/// Default deadline for a request/reply round trip through the service
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a matching engine instance
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Markets whose books are created at startup
    pub markets: Vec<Market>,

    /// Levels per side in depth responses (0 = unlimited)
    pub depth_levels: usize,

    /// How long a service caller waits for the engine's reply
    pub reply_timeout: Duration,

    /// Load demo liquidity into the configured markets after startup
    pub seed_demo_liquidity: bool,

    /// RNG seed for the demo liquidity loader
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            markets: default_markets(),
            depth_levels: DEFAULT_DEPTH_LEVELS,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            seed_demo_liquidity: false,
            seed: 42,
        }
    }
}

impl EngineConfig {
    /// Create a configuration for an explicit market list
    pub fn new(markets: Vec<Market>) -> Self {
        Self {
            markets,
            ..Self::default()
        }
    }

    /// Builder method: Set depth levels per side
    pub fn with_depth_levels(mut self, levels: usize) -> Self {
        self.depth_levels = levels;
        self
    }

    /// Builder method: Set the service reply timeout
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Builder method: Enable demo liquidity with the given seed
    pub fn with_demo_liquidity(mut self, seed: u64) -> Self {
        self.seed_demo_liquidity = true;
        self.seed = seed;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for market in &self.markets {
            if market.name.trim().is_empty() {
                return Err(EngineError::Config(format!(
                    "market {} has no name",
                    market.ticker
                )));
            }
            if !seen.insert(&market.ticker) {
                return Err(EngineError::Config(format!(
                    "duplicate market {}",
                    market.ticker
                )));
            }
        }

        if self.reply_timeout.is_zero() {
            return Err(EngineError::Config(
                "reply timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
