// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod config;
pub mod depth;
pub mod market;
pub mod order;
pub mod order_book;
pub mod trade;

pub use config::EngineConfig;
pub use depth::{DepthLevel, DepthResponse, MarketDepth, TickerStats};
pub use market::{default_markets, Market, MarketId, DEFAULT_MARKETS};
pub use order::{Order, OrderId, OrderType, Side, UserId};
pub use order_book::{BookSide, MatchResult, OrderBook, OrderBookSummary};
pub use trade::{Trade, TradeId};

// Re-export state machine
pub use order::state::{OrderStatus, OrderStatusTransition};
