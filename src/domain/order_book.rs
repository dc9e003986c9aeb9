// ============================================================================
// Order Book Domain Model
// One book per market: resting bids and asks under price-time priority
// ============================================================================

use super::{
    DepthResponse, MarketDepth, MarketId, Order, OrderId, OrderStatus, OrderType, Side, TickerStats,
    Trade, TradeId, UserId,
};
use crate::error::{EngineError, EngineResult};
use crate::numeric::{checked_notional, NumericError, Price, Quantity};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Book Side
// ============================================================================

/// Resting orders of one side, keyed by price, FIFO within a price.
///
/// Bids are consumed from the highest key, asks from the lowest. Within a
/// level orders are kept in ascending `created_at` order.
///
/// `total` is the remaining quantity resting on the side. It never exceeds
/// `Decimal::MAX`, so no level sum or cumulative depth total can overflow.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, VecDeque<Order>>,
    total: Quantity,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            total: Quantity::ZERO,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.levels.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remaining quantity resting on this side
    pub fn total_quantity(&self) -> Quantity {
        self.total
    }

    /// Get the best (top-of-book) price
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Resting orders in matching priority: best price first, oldest first
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Order> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev().flatten()),
            Side::Sell => Box::new(self.levels.values().flatten()),
        }
    }

    /// `(price, total remaining)` per level, best first
    pub fn aggregated_levels(&self) -> impl Iterator<Item = (Price, Quantity)> + '_ {
        let levels: Box<dyn Iterator<Item = (&Price, &VecDeque<Order>)> + '_> = match self.side {
            Side::Buy => Box::new(self.levels.iter().rev()),
            Side::Sell => Box::new(self.levels.iter()),
        };

        levels.map(|(price, orders)| {
            let quantity: Quantity = orders.iter().map(Order::remaining_quantity).sum();
            (*price, quantity)
        })
    }

    fn best_level_mut(&mut self) -> Option<(Price, &mut VecDeque<Order>)> {
        let entry = match self.side {
            Side::Buy => self.levels.iter_mut().next_back(),
            Side::Sell => self.levels.iter_mut().next(),
        };
        entry.map(|(price, orders)| (*price, orders))
    }

    /// Callers check `total + remaining` with `checked_add` first.
    fn insert(&mut self, price: Price, order: Order) {
        self.total += order.remaining_quantity();
        let level = self.levels.entry(price).or_default();
        // Normally appends; an order created earlier than resting ones goes ahead of them
        let position = level.partition_point(|resting| resting.created_at <= order.created_at);
        level.insert(position, order);
    }

    fn remove(&mut self, price: Price, order_id: OrderId) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let position = level.iter().position(|order| order.id == order_id)?;
        let order = level.remove(position)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        self.total -= order.remaining_quantity();
        Some(order)
    }

    fn get(&self, price: Price, order_id: OrderId) -> Option<&Order> {
        self.levels
            .get(&price)?
            .iter()
            .find(|order| order.id == order_id)
    }
}

// ============================================================================
// Match Result
// ============================================================================

/// Everything one placement changed, as owned copies.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchResult {
    /// The incoming order after matching
    pub order: Order,
    /// Resting orders touched by this placement, in match order
    pub updated_makers: SmallVec<[Order; 4]>,
    /// Trades in generation order
    pub trades: SmallVec<[Trade; 4]>,
    /// Whether the incoming order's remainder now rests in the book
    pub rested: bool,
}

impl MatchResult {
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }

    pub fn executed_quantity(&self) -> Quantity {
        self.trades
            .iter()
            .fold(Quantity::ZERO, |total, trade| total.saturating_add(trade.quantity))
    }
}

/// Resting order counts of one book
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSummary {
    pub ticker: String,
    pub bid_count: usize,
    pub ask_count: usize,
}

// ============================================================================
// Order Book
// ============================================================================

/// Limit order book for a single market.
///
/// The book exclusively owns its resting orders; everything it hands out is
/// a copy. Every resting order has a positive remaining quantity.
#[derive(Debug, Clone)]
pub struct OrderBook {
    market: MarketId,
    bids: BookSide,
    asks: BookSide,
    /// Resting order id -> (side, price) for cancellation
    index: HashMap<OrderId, (Side, Price)>,
    last_price: Option<Price>,
    last_trade_id: Option<TradeId>,
}

impl OrderBook {
    pub fn new(market: MarketId) -> Self {
        Self {
            market,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            index: HashMap::new(),
            last_price: None,
            last_trade_id: None,
        }
    }

    pub fn market(&self) -> &MarketId {
        &self.market
    }

    pub fn ticker(&self) -> String {
        self.market.to_string()
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    pub fn last_trade_id(&self) -> Option<TradeId> {
        self.last_trade_id
    }

    /// Total resting orders on both sides
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Copy of a resting order
    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        let (side, price) = *self.index.get(&order_id)?;
        self.side(side).get(price, order_id).cloned()
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match an incoming order and rest any limit remainder.
    ///
    /// Precondition violations are rejected before the book is touched.
    pub fn add_order(&mut self, mut order: Order) -> EngineResult<MatchResult> {
        self.validate_incoming(&order)?;

        let mut updated_makers: SmallVec<[Order; 4]> = SmallVec::new();
        let mut trades: SmallVec<[Trade; 4]> = SmallVec::new();

        let opposite = match order.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };

        while order.remaining_quantity() > Quantity::ZERO {
            let Some((level_price, level)) = opposite.best_level_mut() else {
                break;
            };

            if !order.crosses(level_price) {
                break;
            }

            let mut consumed = Quantity::ZERO;
            while order.remaining_quantity() > Quantity::ZERO {
                let Some(maker) = level.front_mut() else {
                    break;
                };

                let quantity = order.remaining_quantity().min(maker.remaining_quantity());
                let trade = Trade::execute(&order, maker, level_price, quantity);

                maker.fill(quantity);
                order.fill(quantity);
                consumed += quantity;

                debug!(
                    market = %order.market,
                    trade_id = %trade.id,
                    price = %trade.price,
                    quantity = %trade.quantity,
                    maker = %maker.id,
                    taker = %order.id,
                    "trade executed"
                );

                updated_makers.push(maker.clone());
                order.trades.push(trade.clone());
                trades.push(trade);

                if maker.remaining_quantity().is_zero() {
                    let maker_id = maker.id;
                    level.pop_front();
                    self.index.remove(&maker_id);
                }
            }

            let emptied = level.is_empty();
            opposite.total -= consumed;
            if emptied {
                opposite.levels.remove(&level_price);
            }
        }

        if let Some(last) = trades.last() {
            self.last_price = Some(last.price);
            self.last_trade_id = Some(last.id);
        }

        let mut rested = false;
        if order.remaining_quantity() > Quantity::ZERO {
            match (order.order_type, order.price) {
                (OrderType::Limit, Some(price)) => {
                    let mut resting = order.clone();
                    resting.trades.clear();
                    self.index.insert(resting.id, (resting.side, price));
                    match resting.side {
                        Side::Buy => self.bids.insert(price, resting),
                        Side::Sell => self.asks.insert(price, resting),
                    }
                    rested = true;
                },
                _ => {
                    // Market remainder never rests
                    order.cancel();
                },
            }
        }

        debug!(
            market = %self.market,
            order_id = %order.id,
            status = ?order.status(),
            trades = trades.len(),
            rested,
            "order processed"
        );

        Ok(MatchResult {
            order,
            updated_makers,
            trades,
            rested,
        })
    }

    fn validate_incoming(&self, order: &Order) -> EngineResult<()> {
        if order.market != self.market {
            return Err(EngineError::InvalidOrder(format!(
                "order for {} submitted to {}",
                order.market, self.market
            )));
        }

        if order.status() != OrderStatus::Pending || !order.filled_quantity().is_zero() {
            return Err(EngineError::InvalidOrder(
                "only fresh pending orders can be added".to_string(),
            ));
        }

        if order.quantity() <= Quantity::ZERO {
            return Err(EngineError::InvalidOrder(
                "quantity must be positive".to_string(),
            ));
        }

        if order.remaining_quantity() != order.quantity() {
            return Err(EngineError::InvalidOrder(format!(
                "remaining quantity {} does not match quantity {}",
                order.remaining_quantity(),
                order.quantity()
            )));
        }

        if self.index.contains_key(&order.id) {
            return Err(EngineError::InvalidOrder(format!(
                "order {} is already resting",
                order.id
            )));
        }

        match (order.order_type, order.price) {
            (OrderType::Limit, None) => Err(EngineError::InvalidOrder(
                "limit orders must have a price".to_string(),
            )),
            (OrderType::Limit, Some(price)) if price <= Price::ZERO => Err(
                EngineError::InvalidOrder("price must be positive".to_string()),
            ),
            (OrderType::Limit, Some(price)) => {
                // Bounds the notional of every trade this order can take part in
                checked_notional(price, order.quantity())?;
                // A resting remainder must keep the side total representable
                self.side(order.side)
                    .total
                    .checked_add(order.quantity())
                    .ok_or(NumericError::Overflow)?;
                Ok(())
            },
            (OrderType::Market, Some(_)) => Err(EngineError::InvalidOrder(
                "market orders must not carry a price".to_string(),
            )),
            (OrderType::Market, None) => Ok(()),
        }
    }

    // ========================================================================
    // Cancellation and Queries
    // ========================================================================

    /// Remove a resting order owned by `user_id`.
    ///
    /// Returns `None` if the order is not resting here or belongs to someone
    /// else; a foreign order is left untouched.
    pub fn remove_order(&mut self, order_id: OrderId, user_id: UserId) -> Option<Order> {
        let (side, price) = *self.index.get(&order_id)?;

        let book_side = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        if book_side.get(price, order_id)?.user_id != user_id {
            return None;
        }

        let mut order = book_side.remove(price, order_id)?;
        self.index.remove(&order_id);
        order.cancel();
        Some(order)
    }

    /// Copies of every resting order owned by `user_id`, asks then bids
    pub fn get_open_orders(&self, user_id: UserId) -> Vec<Order> {
        self.asks
            .iter()
            .chain(self.bids.iter())
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Aggregated ladder, at most `max_levels` per side (0 = unlimited)
    pub fn get_depth(&self, max_levels: usize) -> MarketDepth {
        let limit = if max_levels == 0 {
            usize::MAX
        } else {
            max_levels
        };

        MarketDepth::from_levels(
            self.market.clone(),
            self.bids.aggregated_levels().take(limit),
            self.asks.aggregated_levels().take(limit),
        )
    }

    /// Ladder as `[price, quantity]` string pairs
    pub fn depth_response(&self, max_levels: usize) -> DepthResponse {
        self.get_depth(max_levels).to_response()
    }

    pub fn ticker_stats(&self) -> TickerStats {
        TickerStats::new(
            self.market.clone(),
            self.last_price,
            self.best_bid(),
            self.best_ask(),
        )
    }

    pub fn summary(&self) -> OrderBookSummary {
        OrderBookSummary {
            ticker: self.ticker(),
            bid_count: self.bids.len(),
            ask_count: self.asks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn btc_usd() -> MarketId {
        "BTC/USD".parse().unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn limit(user: UserId, side: Side, price: &str, quantity: &str) -> Order {
        Order::limit(user, btc_usd(), side, dec(price), dec(quantity))
    }

    fn assert_resting_invariants(book: &OrderBook) {
        for order in book.bids().iter().chain(book.asks().iter()) {
            assert!(order.remaining_quantity() > Decimal::ZERO);
            assert_eq!(
                order.remaining_quantity(),
                order.quantity() - order.filled_quantity()
            );
            assert!(!order.status().is_terminal());
        }
        for side in [book.bids(), book.asks()] {
            let resting: Decimal = side.iter().map(Order::remaining_quantity).sum();
            assert_eq!(side.total_quantity(), resting);
        }
        assert_eq!(book.len(), book.bids().len() + book.asks().len());
    }

    #[test]
    fn test_limit_buy_rests_on_empty_book() {
        let mut book = OrderBook::new(btc_usd());

        let result = book
            .add_order(limit(UserId::new(), Side::Buy, "100", "1.0"))
            .unwrap();

        assert!(result.trades.is_empty());
        assert!(result.rested);
        assert_eq!(result.order.status(), OrderStatus::Pending);

        let depth = book.get_depth(10);
        assert_eq!(depth.bids.len(), 1);
        assert_eq!(depth.bids[0].price, dec("100"));
        assert_eq!(depth.bids[0].quantity, dec("1.0"));
        assert_eq!(depth.bids[0].total, dec("1.0"));
        assert!(depth.asks.is_empty());
    }

    #[test]
    fn test_partial_fill_at_maker_price() {
        let mut book = OrderBook::new(btc_usd());
        let seller = UserId::new();
        let ask = book
            .add_order(limit(seller, Side::Sell, "99", "0.5"))
            .unwrap()
            .order;

        let result = book
            .add_order(limit(UserId::new(), Side::Buy, "100", "1.0"))
            .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, dec("99"));
        assert_eq!(result.trades[0].quantity, dec("0.5"));
        assert_eq!(result.trades[0].seller_order_id, ask.id);
        assert!(!result.trades[0].is_buyer_maker);

        assert_eq!(result.order.remaining_quantity(), dec("0.5"));
        assert_eq!(result.order.status(), OrderStatus::Partial);
        assert!(result.rested);
        assert_eq!(result.order.trades.len(), 1);

        assert_eq!(result.updated_makers.len(), 1);
        assert_eq!(result.updated_makers[0].status(), OrderStatus::Filled);

        assert!(book.asks().is_empty());
        assert!(!book.contains(ask.id));
        assert_eq!(book.best_bid(), Some(dec("100")));
        assert_eq!(book.last_price(), Some(dec("99")));
        assert_eq!(book.last_trade_id(), Some(result.trades[0].id));

        // The resting copy carries no taker trades
        let resting = book.get_order(result.order.id).unwrap();
        assert!(resting.trades.is_empty());
        assert_eq!(resting.status(), OrderStatus::Partial);
        assert_resting_invariants(&book);
    }

    #[test]
    fn test_time_priority_at_equal_price() {
        let mut book = OrderBook::new(btc_usd());
        let t1 = Utc::now() - Duration::seconds(10);
        let t2 = t1 + Duration::seconds(1);

        // Inserted out of creation order to exercise the tie-break
        let second = limit(UserId::new(), Side::Sell, "99", "1.0").with_created_at(t2);
        let first = limit(UserId::new(), Side::Sell, "99", "1.0").with_created_at(t1);
        let (first_id, second_id) = (first.id, second.id);
        book.add_order(second).unwrap();
        book.add_order(first).unwrap();

        let result = book
            .add_order(limit(UserId::new(), Side::Buy, "99", "1.5"))
            .unwrap();

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].seller_order_id, first_id);
        assert_eq!(result.trades[0].quantity, dec("1.0"));
        assert_eq!(result.trades[1].seller_order_id, second_id);
        assert_eq!(result.trades[1].quantity, dec("0.5"));
        assert_eq!(result.order.status(), OrderStatus::Filled);
        assert!(!result.rested);

        let remaining = book.get_order(second_id).unwrap();
        assert_eq!(remaining.remaining_quantity(), dec("0.5"));
        assert_eq!(remaining.status(), OrderStatus::Partial);
        assert!(book.bids().is_empty());
        assert_resting_invariants(&book);
    }

    #[test]
    fn test_price_priority_across_levels() {
        let mut book = OrderBook::new(btc_usd());
        let user = UserId::new();
        book.add_order(limit(user, Side::Buy, "98", "1")).unwrap();
        let best = book.add_order(limit(user, Side::Buy, "101", "1")).unwrap().order;
        book.add_order(limit(user, Side::Buy, "100", "1")).unwrap();

        let result = book
            .add_order(limit(UserId::new(), Side::Sell, "99", "2.5"))
            .unwrap();

        // 101 first, then 100; 98 does not cross
        let prices: Vec<_> = result.trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![dec("101"), dec("100")]);
        assert_eq!(result.trades[0].buyer_order_id, best.id);
        assert!(result.trades.iter().all(|t| t.is_buyer_maker));

        assert_eq!(result.order.remaining_quantity(), dec("0.5"));
        assert_eq!(book.best_ask(), Some(dec("99")));
        assert_eq!(book.best_bid(), Some(dec("98")));
        assert_resting_invariants(&book);
    }

    #[test]
    fn test_no_cross_rests_both_sides() {
        let mut book = OrderBook::new(btc_usd());
        book.add_order(limit(UserId::new(), Side::Sell, "101", "1")).unwrap();
        let result = book.add_order(limit(UserId::new(), Side::Buy, "100", "1")).unwrap();

        assert!(!result.has_trades());
        assert_eq!(book.summary().bid_count, 1);
        assert_eq!(book.summary().ask_count, 1);
        assert_eq!(book.ticker_stats().spread, Some(dec("1")));
        assert_eq!(book.last_price(), None);
    }

    #[test]
    fn test_market_order_sweeps_and_never_rests() {
        let mut book = OrderBook::new(btc_usd());
        book.add_order(limit(UserId::new(), Side::Sell, "100", "1")).unwrap();
        book.add_order(limit(UserId::new(), Side::Sell, "250", "1")).unwrap();

        let partial = book
            .add_order(Order::market(UserId::new(), btc_usd(), Side::Buy, dec("3")))
            .unwrap();

        assert_eq!(partial.trades.len(), 2);
        assert_eq!(partial.executed_quantity(), dec("2"));
        assert_eq!(partial.order.status(), OrderStatus::Cancelled);
        assert_eq!(partial.order.filled_quantity(), dec("2"));
        assert!(!partial.rested);
        assert!(book.is_empty());

        // Nothing to take: cancelled without fills
        let empty = book
            .add_order(Order::market(UserId::new(), btc_usd(), Side::Sell, dec("1")))
            .unwrap();
        assert!(empty.trades.is_empty());
        assert_eq!(empty.order.status(), OrderStatus::Cancelled);
        assert!(book.is_empty());
    }

    #[test]
    fn test_market_order_fully_filled() {
        let mut book = OrderBook::new(btc_usd());
        book.add_order(limit(UserId::new(), Side::Buy, "100", "2")).unwrap();

        let result = book
            .add_order(Order::market(UserId::new(), btc_usd(), Side::Sell, dec("1.5")))
            .unwrap();

        assert_eq!(result.order.status(), OrderStatus::Filled);
        assert_eq!(result.trades[0].price, dec("100"));
        assert_eq!(book.best_bid(), Some(dec("100")));
        assert_eq!(book.get_depth(0).bids[0].quantity, dec("0.5"));
    }

    #[test]
    fn test_self_trade_is_allowed() {
        let mut book = OrderBook::new(btc_usd());
        let user = UserId::new();
        book.add_order(limit(user, Side::Sell, "100", "1")).unwrap();

        let result = book.add_order(limit(user, Side::Buy, "100", "1")).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].buyer_user_id, user);
        assert_eq!(result.trades[0].seller_user_id, user);
        assert!(book.is_empty());
    }

    #[test]
    fn test_precondition_violations_rejected() {
        let mut book = OrderBook::new(btc_usd());
        book.add_order(limit(UserId::new(), Side::Sell, "100", "1")).unwrap();

        let no_price = Order::new(
            UserId::new(),
            btc_usd(),
            Side::Buy,
            OrderType::Limit,
            None,
            dec("1"),
        );
        assert!(matches!(book.add_order(no_price), Err(EngineError::InvalidOrder(_))));

        let priced_market = Order::new(
            UserId::new(),
            btc_usd(),
            Side::Buy,
            OrderType::Market,
            Some(dec("100")),
            dec("1"),
        );
        assert!(book.add_order(priced_market).is_err());

        assert!(book.add_order(limit(UserId::new(), Side::Buy, "100", "0")).is_err());
        assert!(book.add_order(limit(UserId::new(), Side::Buy, "-1", "1")).is_err());

        let wrong_market = Order::limit(
            UserId::new(),
            "ETH/USD".parse().unwrap(),
            Side::Buy,
            dec("100"),
            dec("1"),
        );
        assert!(book.add_order(wrong_market).is_err());

        // The resting ask is untouched by every rejection
        assert_eq!(book.asks().len(), 1);
        assert_eq!(book.last_price(), None);
    }

    #[test]
    fn test_side_total_overflow_rejected_on_entry() {
        let mut book = OrderBook::new(btc_usd());
        let huge = "50000000000000000000000000000";

        book.add_order(limit(UserId::new(), Side::Buy, "1", huge)).unwrap();

        // Same level and a different level would both push the bid total past Decimal::MAX
        let same_level = book.add_order(limit(UserId::new(), Side::Buy, "1", huge));
        assert!(matches!(
            same_level,
            Err(EngineError::Numeric(NumericError::Overflow))
        ));
        assert!(book.add_order(limit(UserId::new(), Side::Buy, "0.5", huge)).is_err());

        assert_eq!(book.len(), 1);
        assert_eq!(book.bids().total_quantity(), dec(huge));
        let depth = book.get_depth(0);
        assert_eq!(depth.bids.len(), 1);
        assert_eq!(depth.bids[0].total, dec(huge));

        // The ask side has its own headroom
        book.add_order(limit(UserId::new(), Side::Sell, "1.5", huge)).unwrap();
        assert_eq!(book.asks().total_quantity(), dec(huge));

        // Consuming the bid frees room for another one
        let sweep = book
            .add_order(Order::market(UserId::new(), btc_usd(), Side::Sell, dec(huge)))
            .unwrap();
        assert_eq!(sweep.order.status(), OrderStatus::Filled);
        assert_eq!(sweep.executed_quantity(), dec(huge));
        assert_eq!(book.bids().total_quantity(), Decimal::ZERO);

        book.add_order(limit(UserId::new(), Side::Buy, "1", huge)).unwrap();
        assert_eq!(book.get_depth(0).bids[0].total, dec(huge));
        assert_resting_invariants(&book);
    }

    #[test]
    fn test_side_totals_follow_fills_and_removals() {
        let mut book = OrderBook::new(btc_usd());
        let owner = UserId::new();
        book.add_order(limit(owner, Side::Sell, "101", "2")).unwrap();
        let cancelled = book.add_order(limit(owner, Side::Sell, "102", "3")).unwrap().order;
        assert_eq!(book.asks().total_quantity(), dec("5"));

        book.add_order(limit(UserId::new(), Side::Buy, "101", "0.5")).unwrap();
        assert_eq!(book.asks().total_quantity(), dec("4.5"));

        book.remove_order(cancelled.id, owner).unwrap();
        assert_eq!(book.asks().total_quantity(), dec("1.5"));
        assert_resting_invariants(&book);
    }

    #[test]
    fn test_duplicate_resting_id_rejected() {
        let mut book = OrderBook::new(btc_usd());
        let order = limit(UserId::new(), Side::Buy, "100", "1");
        book.add_order(order.clone()).unwrap();
        assert!(book.add_order(order).is_err());
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_remove_order_checks_ownership() {
        let mut book = OrderBook::new(btc_usd());
        let owner = UserId::new();
        let order = book.add_order(limit(owner, Side::Buy, "100", "1")).unwrap().order;

        assert!(book.remove_order(order.id, UserId::new()).is_none());
        assert!(book.contains(order.id));

        let removed = book.remove_order(order.id, owner).unwrap();
        assert_eq!(removed.id, order.id);
        assert_eq!(removed.status(), OrderStatus::Cancelled);
        assert!(book.is_empty());
        assert!(book.get_depth(10).bids.is_empty());

        // Second removal finds nothing
        assert!(book.remove_order(order.id, owner).is_none());
    }

    #[test]
    fn test_open_orders_snapshot() {
        let mut book = OrderBook::new(btc_usd());
        let alice = UserId::new();
        let bob = UserId::new();
        book.add_order(limit(alice, Side::Buy, "99", "1")).unwrap();
        book.add_order(limit(alice, Side::Sell, "105", "2")).unwrap();
        book.add_order(limit(bob, Side::Buy, "98", "1")).unwrap();

        let open = book.get_open_orders(alice);
        assert_eq!(open.len(), 2);
        assert!(open.iter().all(|o| o.user_id == alice));
        assert!(book.get_open_orders(UserId::new()).is_empty());
    }

    #[test]
    fn test_depth_aggregates_and_truncates() {
        let mut book = OrderBook::new(btc_usd());
        let user = UserId::new();
        book.add_order(limit(user, Side::Buy, "100", "1")).unwrap();
        book.add_order(limit(user, Side::Buy, "100.0", "2")).unwrap();
        book.add_order(limit(user, Side::Buy, "99", "1")).unwrap();
        book.add_order(limit(user, Side::Buy, "98", "1")).unwrap();
        book.add_order(limit(user, Side::Sell, "102", "1")).unwrap();
        book.add_order(limit(user, Side::Sell, "101", "4")).unwrap();

        let depth = book.get_depth(2);
        assert_eq!(depth.bids.len(), 2);
        assert_eq!(depth.bids[0].price, dec("100"));
        assert_eq!(depth.bids[0].quantity, dec("3"));
        assert_eq!(depth.bids[1].total, dec("4"));
        assert_eq!(depth.asks[0].price, dec("101"));
        assert_eq!(depth.asks[1].total, dec("5"));

        assert_eq!(book.get_depth(0).bids.len(), 3);
        // Read-only
        assert_eq!(book.len(), 6);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Limit {
            side: Side,
            price: i64,
            quantity: i64,
            user: usize,
        },
        Market {
            side: Side,
            quantity: i64,
            user: usize,
        },
        Cancel {
            target: prop::sample::Index,
            by_owner: bool,
        },
    }

    fn side_of(buy: bool) -> Side {
        if buy {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (any::<bool>(), 95i64..=105, 1i64..=50, 0usize..3).prop_map(
                |(buy, price, quantity, user)| Op::Limit {
                    side: side_of(buy),
                    price,
                    quantity,
                    user,
                }
            ),
            1 => (any::<bool>(), 1i64..=80, 0usize..3).prop_map(|(buy, quantity, user)| {
                Op::Market {
                    side: side_of(buy),
                    quantity,
                    user,
                }
            }),
            2 => (any::<prop::sample::Index>(), any::<bool>())
                .prop_map(|(target, by_owner)| Op::Cancel { target, by_owner }),
        ]
    }

    proptest! {
        #[test]
        fn prop_matching_preserves_book_invariants(ops in prop::collection::vec(op(), 1..80)) {
            let mut book = OrderBook::new(btc_usd());
            let users = [UserId::new(), UserId::new(), UserId::new()];

            // Every order ever placed, its latest known state and what trades say it executed
            let mut placed: Vec<OrderId> = Vec::new();
            let mut latest: HashMap<OrderId, Order> = HashMap::new();
            let mut executed: HashMap<OrderId, Decimal> = HashMap::new();

            for op in ops {
                // Quantities in tenths to exercise fractional arithmetic
                let order = match op {
                    Op::Limit { side, price, quantity, user } => Order::limit(
                        users[user],
                        btc_usd(),
                        side,
                        Decimal::from(price),
                        Decimal::new(quantity, 1),
                    ),
                    Op::Market { side, quantity, user } => {
                        Order::market(users[user], btc_usd(), side, Decimal::new(quantity, 1))
                    },
                    Op::Cancel { target, by_owner } => {
                        if placed.is_empty() {
                            continue;
                        }
                        let id = placed[target.index(placed.len())];
                        let owner = latest[&id].user_id;
                        let was_resting = book.contains(id);
                        let caller = if by_owner { owner } else { UserId::new() };

                        match book.remove_order(id, caller) {
                            Some(cancelled) => {
                                prop_assert!(by_owner && was_resting);
                                prop_assert_eq!(cancelled.status(), OrderStatus::Cancelled);
                                prop_assert_eq!(
                                    cancelled.filled_quantity(),
                                    latest[&id].filled_quantity()
                                );
                                prop_assert!(!book.contains(id));
                                latest.insert(id, cancelled);
                            },
                            None => {
                                // Foreign cancels leave the order where it was
                                prop_assert!(!by_owner || !was_resting);
                                prop_assert_eq!(book.contains(id), was_resting);
                            },
                        }
                        assert_resting_invariants(&book);
                        continue;
                    },
                };

                let result = book.add_order(order).unwrap();
                let taker = &result.order;

                // No over-fill and exact bookkeeping on the taker
                prop_assert!(taker.filled_quantity() <= taker.quantity());
                prop_assert_eq!(taker.remaining_quantity(), taker.quantity() - taker.filled_quantity());
                prop_assert_eq!(taker.filled_quantity(), result.executed_quantity());

                for (trade, maker) in result.trades.iter().zip(result.updated_makers.iter()) {
                    // Maker price rule
                    prop_assert_eq!(Some(trade.price), maker.price);
                    prop_assert_eq!(trade.maker_order_id(), maker.id);
                    prop_assert!(taker.crosses(trade.price));

                    // Maker bookkeeping: filled grows by exactly the executed quantity
                    let before = latest.get(&maker.id).map(Order::filled_quantity).unwrap_or_default();
                    prop_assert_eq!(maker.filled_quantity(), before + trade.quantity);
                    prop_assert!(maker.filled_quantity() <= maker.quantity());

                    // Removal correctness
                    prop_assert_eq!(book.contains(maker.id), !maker.remaining_quantity().is_zero());
                    latest.insert(maker.id, maker.clone());

                    *executed.entry(trade.buyer_order_id).or_default() += trade.quantity;
                    *executed.entry(trade.seller_order_id).or_default() += trade.quantity;
                }

                if taker.order_type == OrderType::Market {
                    prop_assert!(!result.rested);
                    prop_assert!(taker.status().is_terminal());
                }
                prop_assert_eq!(book.contains(taker.id), result.rested);

                placed.push(taker.id);
                latest.insert(taker.id, taker.clone());

                // The book never stays crossed
                if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
                    prop_assert!(bid < ask);
                }
                assert_resting_invariants(&book);
            }

            // Quantity is conserved: per order, trades add up to the recorded fill
            for (id, order) in &latest {
                let traded = executed.get(id).copied().unwrap_or_default();
                prop_assert_eq!(traded, order.filled_quantity());
                prop_assert!(order.filled_quantity() <= order.quantity());
                prop_assert_eq!(order.remaining_quantity(), order.quantity() - order.filled_quantity());
            }
        }
    }
}
