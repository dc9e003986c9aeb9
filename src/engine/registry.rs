// ============================================================================
// Order Book Registry
// One book per market, created on first reference
// ============================================================================

use crate::domain::{MarketId, OrderBook};
use std::collections::HashMap;
use tracing::info;

/// Owns every order book of an engine instance.
///
/// Books are never removed; iteration follows creation order.
#[derive(Debug, Default)]
pub struct OrderBookRegistry {
    books: Vec<OrderBook>,
    index: HashMap<MarketId, usize>,
}

impl OrderBookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent lookup-or-create
    pub fn find_or_create(&mut self, market: &MarketId) -> &mut OrderBook {
        let slot = match self.index.get(market) {
            Some(&slot) => slot,
            None => {
                let slot = self.books.len();
                self.books.push(OrderBook::new(market.clone()));
                self.index.insert(market.clone(), slot);
                info!(market = %market, "created order book");
                slot
            },
        };
        &mut self.books[slot]
    }

    pub fn get(&self, market: &MarketId) -> Option<&OrderBook> {
        self.index.get(market).map(|&slot| &self.books[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderBook> {
        self.books.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OrderBook> {
        self.books.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
