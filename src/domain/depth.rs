// ============================================================================
// Depth and Ticker Projections
// Read-only views derived from an order book
// ============================================================================

use super::MarketId;
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregated resting quantity at one price
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    /// Running sum of `quantity` from the best level down to this one
    pub total: Quantity,
}

/// Price ladder of one market. Bids descending, asks ascending.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarketDepth {
    pub market: MarketId,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub timestamp: DateTime<Utc>,
}

impl MarketDepth {
    /// Build a ladder from `(price, quantity)` levels already in priority order.
    pub fn from_levels(
        market: MarketId,
        bids: impl IntoIterator<Item = (Price, Quantity)>,
        asks: impl IntoIterator<Item = (Price, Quantity)>,
    ) -> Self {
        Self {
            market,
            bids: cumulative(bids),
            asks: cumulative(asks),
            timestamp: Utc::now(),
        }
    }

    pub fn empty(market: MarketId) -> Self {
        Self::from_levels(market, std::iter::empty(), std::iter::empty())
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    /// Wire form: `[price, quantity]` string pairs per side
    pub fn to_response(&self) -> DepthResponse {
        let pairs = |levels: &[DepthLevel]| {
            levels
                .iter()
                .map(|level| [level.price.to_string(), level.quantity.to_string()])
                .collect()
        };

        DepthResponse {
            market: self.market.to_string(),
            bids: pairs(&self.bids),
            asks: pairs(&self.asks),
        }
    }
}

fn cumulative(levels: impl IntoIterator<Item = (Price, Quantity)>) -> Vec<DepthLevel> {
    let mut total = Quantity::ZERO;
    levels
        .into_iter()
        .map(|(price, quantity)| {
            // Saturates instead of panicking on ladders built outside a book
            total = total.saturating_add(quantity);
            DepthLevel {
                price,
                quantity,
                total,
            }
        })
        .collect()
}

/// Depth as returned to gateway clients
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthResponse {
    pub market: String,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

/// Top-of-book statistics for one market
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickerStats {
    pub market: MarketId,
    pub last_price: Option<Price>,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    /// `best_ask - best_bid`
    pub spread: Option<Price>,
    /// Spread as a percentage of the best ask
    pub spread_percent: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl TickerStats {
    pub fn new(
        market: MarketId,
        last_price: Option<Price>,
        best_bid: Option<Price>,
        best_ask: Option<Price>,
    ) -> Self {
        let spread = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        };

        let spread_percent = match (spread, best_ask) {
            (Some(spread), Some(ask)) if !ask.is_zero() => spread
                .checked_div(ask)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(4)),
            _ => None,
        };

        Self {
            market,
            last_price,
            best_bid,
            best_ask,
            spread,
            spread_percent,
            timestamp: Utc::now(),
        }
    }
}
