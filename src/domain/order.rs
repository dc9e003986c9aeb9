// ============================================================================
// Order Domain Model
// ============================================================================

use super::{MarketId, Trade};
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Owner of an order. Opaque to the matching core; only compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum OrderType {
    /// Rests in the book at its limit price until filled or cancelled
    Limit,
    /// Takes liquidity at any price; never rests
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => f.write_str("LIMIT"),
            OrderType::Market => f.write_str("MARKET"),
        }
    }
}

// ============================================================================
// Order State Machine
// ============================================================================

pub mod state {
    use thiserror::Error;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
    pub enum OrderStatus {
        Pending,
        Partial,
        Filled,
        Cancelled,
    }

    impl OrderStatus {
        pub fn is_terminal(&self) -> bool {
            matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
        }

        pub fn can_be_cancelled(&self) -> bool {
            matches!(self, OrderStatus::Pending | OrderStatus::Partial)
        }
    }

    /// Valid state transitions for the order state machine
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum OrderStatusTransition {
        PartialFill,
        Fill,
        Cancel,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    #[error("invalid transition from {from:?} via {via:?}")]
    pub struct InvalidTransition {
        pub from: OrderStatus,
        pub via: OrderStatusTransition,
    }

    impl OrderStatus {
        pub fn transition(
            &self,
            transition: OrderStatusTransition,
        ) -> Result<OrderStatus, InvalidTransition> {
            match (self, transition) {
                (OrderStatus::Pending, OrderStatusTransition::PartialFill)
                | (OrderStatus::Partial, OrderStatusTransition::PartialFill) => {
                    Ok(OrderStatus::Partial)
                },
                (OrderStatus::Pending, OrderStatusTransition::Fill)
                | (OrderStatus::Partial, OrderStatusTransition::Fill) => Ok(OrderStatus::Filled),
                (OrderStatus::Pending, OrderStatusTransition::Cancel)
                | (OrderStatus::Partial, OrderStatusTransition::Cancel) => {
                    Ok(OrderStatus::Cancelled)
                },
                _ => Err(InvalidTransition {
                    from: *self,
                    via: transition,
                }),
            }
        }
    }
}

use state::{OrderStatus, OrderStatusTransition};

// ============================================================================
// Order Entity
// ============================================================================

/// An order and its fill bookkeeping.
///
/// `filled_quantity`, `remaining_quantity` and `status` are only changed
/// through [`Order::fill`] and [`Order::cancel`], which keep
/// `remaining = quantity - filled` and never move a terminal order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub market: MarketId,
    pub side: Side,
    pub order_type: OrderType,
    /// Present for limit orders only
    pub price: Option<Price>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Trades this order took part in as the taker, in execution order
    pub trades: Vec<Trade>,

    quantity: Quantity,
    filled_quantity: Quantity,
    remaining_quantity: Quantity,
    status: OrderStatus,
}

impl Order {
    pub fn new(
        user_id: UserId,
        market: MarketId,
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        quantity: Quantity,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            market,
            side,
            order_type,
            quantity,
            price,
            created_at: now,
            updated_at: now,
            trades: Vec::new(),
            filled_quantity: Quantity::ZERO,
            remaining_quantity: quantity,
            status: OrderStatus::Pending,
        }
    }

    /// Create a new limit order
    pub fn limit(
        user_id: UserId,
        market: MarketId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self::new(user_id, market, side, OrderType::Limit, Some(price), quantity)
    }

    /// Create a new market order
    pub fn market(user_id: UserId, market: MarketId, side: Side, quantity: Quantity) -> Self {
        Self::new(user_id, market, side, OrderType::Market, None, quantity)
    }

    /// Override the creation time (time priority among equal prices)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Original quantity
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_market_order(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }

    pub fn is_limit_order(&self) -> bool {
        matches!(self.order_type, OrderType::Limit)
    }

    /// Whether this order, as the taker, may trade against a resting price
    pub fn crosses(&self, resting_price: Price) -> bool {
        match (self.order_type, self.price) {
            (OrderType::Market, _) => true,
            (OrderType::Limit, Some(limit)) => match self.side {
                Side::Buy => resting_price <= limit,
                Side::Sell => resting_price >= limit,
            },
            (OrderType::Limit, None) => false,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply an execution of `quantity`.
    ///
    /// Returns false, leaving the order untouched, if the quantity is not
    /// positive, exceeds the remaining quantity, or the order is terminal.
    pub fn fill(&mut self, quantity: Quantity) -> bool {
        if quantity <= Quantity::ZERO || quantity > self.remaining_quantity {
            return false;
        }

        let filled = self.filled_quantity + quantity;
        let remaining = self.quantity - filled;
        let via = if remaining.is_zero() {
            OrderStatusTransition::Fill
        } else {
            OrderStatusTransition::PartialFill
        };

        match self.status.transition(via) {
            Ok(next) => {
                self.filled_quantity = filled;
                self.remaining_quantity = remaining;
                self.status = next;
                self.updated_at = Utc::now();
                true
            },
            Err(_) => false,
        }
    }

    /// Cancel the unfilled remainder. Fills already applied are kept.
    pub fn cancel(&mut self) -> bool {
        match self.status.transition(OrderStatusTransition::Cancel) {
            Ok(next) => {
                self.status = next;
                self.updated_at = Utc::now();
                true
            },
            Err(_) => false,
        }
    }
}
