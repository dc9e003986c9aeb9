// ============================================================================
// Trade Domain Model
// ============================================================================

use super::{MarketId, Order, OrderId, Side, UserId};
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeId(Uuid);

impl TradeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An execution between a resting (maker) order and an incoming (taker) order.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    pub id: TradeId,
    pub market: MarketId,
    pub buyer_order_id: OrderId,
    pub seller_order_id: OrderId,
    pub buyer_user_id: UserId,
    pub seller_user_id: UserId,
    /// Always the maker's price
    pub price: Price,
    pub quantity: Quantity,
    /// `price × quantity`
    pub quote_quantity: Decimal,
    pub is_buyer_maker: bool,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// Record an execution of `quantity` at the maker's `price`.
    ///
    /// The notional cannot overflow: both orders had their own notional
    /// checked on entry and the execution is bounded by either of them.
    pub fn execute(taker: &Order, maker: &Order, price: Price, quantity: Quantity) -> Self {
        let (buyer, seller) = match taker.side {
            Side::Buy => (taker, maker),
            Side::Sell => (maker, taker),
        };

        Self {
            id: TradeId::new(),
            market: taker.market.clone(),
            buyer_order_id: buyer.id,
            seller_order_id: seller.id,
            buyer_user_id: buyer.user_id,
            seller_user_id: seller.user_id,
            price,
            quantity,
            quote_quantity: price * quantity,
            is_buyer_maker: maker.side == Side::Buy,
            created_at: Utc::now(),
        }
    }

    pub fn maker_order_id(&self) -> OrderId {
        if self.is_buyer_maker {
            self.buyer_order_id
        } else {
            self.seller_order_id
        }
    }

    pub fn taker_order_id(&self) -> OrderId {
        if self.is_buyer_maker {
            self.seller_order_id
        } else {
            self.buyer_order_id
        }
    }
}
