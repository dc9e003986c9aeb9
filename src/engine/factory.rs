// ============================================================================
// Engine Factory
// Creates matching engines with proper configuration
// ============================================================================

use super::matching_engine::MatchingEngine;
use super::seed::seed_demo_liquidity;
use crate::domain::{EngineConfig, Market};
use crate::error::EngineResult;
use crate::interfaces::EventHandler;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a matching engine from configuration
///
/// # Arguments
/// * `config` - Engine configuration
/// * `event_handler` - Receiver of order, trade, depth and ticker events
///
/// Demo liquidity is loaded before the engine is returned when the
/// configuration asks for it.
///
/// # Example
/// ```
/// use spot_matching_engine::prelude::*;
/// use spot_matching_engine::engine::factory::create_from_config;
/// use std::sync::Arc;
///
/// let engine = create_from_config(EngineConfig::default(), Arc::new(NoOpEventHandler)).unwrap();
/// assert_eq!(engine.list_orderbooks().total_orderbooks, 19);
/// ```
pub fn create_from_config(
    config: EngineConfig,
    event_handler: Arc<dyn EventHandler>,
) -> EngineResult<MatchingEngine> {
    let seed = config.seed_demo_liquidity.then_some(config.seed);
    let mut engine = MatchingEngine::new(config, event_handler)?;

    if let Some(seed) = seed {
        let orders = seed_demo_liquidity(&mut engine, seed)?;
        info!(orders, seed, "engine started with demo liquidity");
    }

    Ok(engine)
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating matching engines with fluent API
///
/// # Example
/// ```
/// use spot_matching_engine::prelude::*;
/// use spot_matching_engine::engine::factory::MatchingEngineBuilder;
/// use std::sync::Arc;
///
/// let engine = MatchingEngineBuilder::new()
///     .with_market(Market::new("Bitcoin", "BTC/USD").unwrap())
///     .with_depth_levels(10)
///     .build(Arc::new(NoOpEventHandler))
///     .unwrap();
///
/// assert_eq!(engine.markets().len(), 1);
/// ```
pub struct MatchingEngineBuilder {
    config: EngineConfig,
    markets: Vec<Market>,
}

impl Default for MatchingEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngineBuilder {
    /// Start from the default configuration. Adding any market replaces
    /// the default market list.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            markets: Vec::new(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            markets: Vec::new(),
        }
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.markets.push(market);
        self
    }

    pub fn with_markets(mut self, markets: impl IntoIterator<Item = Market>) -> Self {
        self.markets.extend(markets);
        self
    }

    pub fn with_depth_levels(mut self, levels: usize) -> Self {
        self.config = self.config.with_depth_levels(levels);
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_reply_timeout(timeout);
        self
    }

    pub fn with_demo_liquidity(mut self, seed: u64) -> Self {
        self.config = self.config.with_demo_liquidity(seed);
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the matching engine
    pub fn build(self, event_handler: Arc<dyn EventHandler>) -> EngineResult<MatchingEngine> {
        create_from_config(self.into_config(), event_handler)
    }

    /// The configuration `build` would use
    pub fn into_config(self) -> EngineConfig {
        let mut config = self.config;
        if !self.markets.is_empty() {
            config.markets = self.markets;
        }
        config
    }
}
