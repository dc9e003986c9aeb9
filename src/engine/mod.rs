// ============================================================================
// Engine Module
// Multi-market matching, request contract and the sequential service
// ============================================================================

mod matching_engine;
mod registry;
mod requests;
mod service;

pub mod factory;
pub mod seed;

pub use factory::{create_from_config, MatchingEngineBuilder};
pub use matching_engine::MatchingEngine;
pub use registry::OrderBookRegistry;
pub use requests::{
    CancelOrderRequest, CancelOrderResponse, EngineRequest, EngineResponse, OrderBooksResponse,
    OrderRequest,
};
pub use seed::{seed_demo_liquidity, MarketSeed, MARKET_SEEDS};
pub use service::{EngineHandle, EngineService};
