// ============================================================================
// Spot Matching Engine Library
// Multi-market order books with strict price-time priority
// ============================================================================

//! # Spot Matching Engine
//!
//! The matching core of a spot exchange: one limit order book per market,
//! an engine that routes requests to the right book, and a sequential
//! service boundary for callers on other threads.
//!
//! ## Features
//!
//! - **Price-time priority** matching; every trade executes at the resting order's price
//! - **Exact decimal arithmetic** for prices and quantities
//! - **Owned copies** out of the book: callers never alias resting orders
//! - **Event notifications** for orders, trades, depth and ticker changes
//! - **Single sequential consumer** with bounded reply timeouts
//!
//! ## Example
//!
//! ```rust
//! use spot_matching_engine::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! let mut engine = MatchingEngine::new(EngineConfig::default(), Arc::new(NoOpEventHandler)).unwrap();
//!
//! let seller = UserId::new();
//! let buyer = UserId::new();
//!
//! engine
//!     .create_order(OrderRequest::limit(seller, "BTC/USD", Side::Sell, Decimal::from(99), Decimal::new(5, 1)))
//!     .unwrap();
//!
//! let order = engine
//!     .create_order(OrderRequest::limit(buyer, "BTC/USD", Side::Buy, Decimal::from(100), Decimal::ONE))
//!     .unwrap();
//!
//! assert_eq!(order.status(), OrderStatus::Partial);
//! assert_eq!(order.trades[0].price, Decimal::from(99));
//!
//! let depth = engine.get_depth("BTC/USD", None).unwrap();
//! println!("Bids: {:?}", depth.bids);
//! println!("Asks: {:?}", depth.asks);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod numeric;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        DepthLevel, DepthResponse, EngineConfig, Market, MarketDepth, MarketId, Order, OrderBook,
        OrderBookSummary, OrderId, OrderStatus, OrderType, Side, TickerStats, Trade, TradeId,
        UserId,
    };
    pub use crate::engine::{
        create_from_config, CancelOrderRequest, CancelOrderResponse, EngineHandle, EngineRequest,
        EngineResponse, EngineService, MatchingEngine, MatchingEngineBuilder, OrderBooksResponse,
        OrderRequest,
    };
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::interfaces::{
        ChannelEventHandler, EngineEvent, EventHandler, LoggingEventHandler, NoOpEventHandler,
        RecordingEventHandler,
    };
    pub use crate::numeric::{Price, Quantity};
}
