// ============================================================================
// Engine Requests and Responses
// The typed in-process contract of the matching core
// ============================================================================

use crate::domain::{
    DepthResponse, Market, Order, OrderBookSummary, OrderId, OrderType, Side, TickerStats, UserId,
};
use crate::numeric::{Price, Quantity};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Place an order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderRequest {
    pub user_id: UserId,
    /// Ticker, `BASE/QUOTE`
    pub market: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Option<Price>,
}

impl OrderRequest {
    pub fn limit(
        user_id: UserId,
        market: impl Into<String>,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            user_id,
            market: market.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
        }
    }

    pub fn market(user_id: UserId, market: impl Into<String>, side: Side, quantity: Quantity) -> Self {
        Self {
            user_id,
            market: market.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
        }
    }
}

/// Cancel a resting order. Carries no market: every book is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CancelOrderRequest {
    pub user_id: UserId,
    pub order_id: OrderId,
}

/// Result of a cancellation. Not finding the order is a plain `success: false`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CancelOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub order: Option<Order>,
}

/// Resting counts of every managed book
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBooksResponse {
    pub total_orderbooks: usize,
    pub orderbooks: Vec<OrderBookSummary>,
}

/// Requests accepted by the sequential processor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EngineRequest {
    CreateOrder(OrderRequest),
    CancelOrder(CancelOrderRequest),
    /// `levels` per side; absent means the configured `depth_levels`
    GetDepth {
        market: String,
        #[cfg_attr(feature = "serde", serde(default))]
        levels: Option<usize>,
    },
    GetOpenOrders { user_id: UserId, market: Option<String> },
    GetTicker { market: String },
    ListOrderbooks,
    GetMarkets,
    /// Stop the processor after the requests queued before it
    Shutdown,
}

/// Replies of the sequential processor, one variant per request kind
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EngineResponse {
    OrderPlaced(Order),
    OrderCancelled(CancelOrderResponse),
    Depth(DepthResponse),
    OpenOrders(Vec<Order>),
    Ticker(TickerStats),
    Orderbooks(OrderBooksResponse),
    Markets(Vec<Market>),
    ShuttingDown,
}
