// ============================================================================
// Matching Engine
// Routes requests to per-market books and emits the resulting events
// ============================================================================

use super::registry::OrderBookRegistry;
use super::requests::{CancelOrderRequest, CancelOrderResponse, OrderBooksResponse, OrderRequest};
use crate::domain::{
    DepthResponse, EngineConfig, Market, MarketDepth, MarketId, Order, OrderBook, OrderStatus,
    TickerStats, UserId,
};
use crate::error::EngineResult;
use crate::interfaces::{EngineEvent, EventHandler};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Multi-market matching engine.
///
/// Every method runs to completion before returning; callers serialize
/// access (see [`crate::engine::EngineService`]).
pub struct MatchingEngine {
    books: OrderBookRegistry,
    config: EngineConfig,
    event_handler: Arc<dyn EventHandler>,
}

impl MatchingEngine {
    /// Validate the configuration and create a book for every configured market
    pub fn new(config: EngineConfig, event_handler: Arc<dyn EventHandler>) -> EngineResult<Self> {
        config.validate()?;

        let mut books = OrderBookRegistry::new();
        for market in &config.markets {
            books.find_or_create(&market.ticker);
        }

        info!(markets = books.len(), "matching engine initialised");

        Ok(Self {
            books,
            config,
            event_handler,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &OrderBookRegistry {
        &self.books
    }

    /// Idempotent lookup-or-create. A malformed ticker creates nothing.
    pub fn find_or_create_orderbook(&mut self, market: &str) -> EngineResult<&mut OrderBook> {
        let market: MarketId = market.parse()?;
        Ok(self.books.find_or_create(&market))
    }

    pub fn orderbook(&self, market: &MarketId) -> Option<&OrderBook> {
        self.books.get(market)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Place an order and emit one event per state change it caused.
    ///
    /// Event order: the placed order as accepted, every touched resting
    /// order, every trade, the incoming order's final state if it moved,
    /// then the market's depth and ticker.
    pub fn create_order(&mut self, request: OrderRequest) -> EngineResult<Order> {
        let market: MarketId = request.market.parse()?;
        let order = Order::new(
            request.user_id,
            market.clone(),
            request.side,
            request.order_type,
            request.price,
            request.quantity,
        );
        let placed = order.clone();

        let book = self.books.find_or_create(&market);
        let result = match book.add_order(order) {
            Ok(result) => result,
            Err(err) => {
                warn!(market = %market, user_id = %request.user_id, error = %err, "order rejected");
                return Err(err);
            },
        };
        let depth = book.get_depth(self.config.depth_levels);
        let ticker = book.ticker_stats();

        let mut events = Vec::with_capacity(4 + result.updated_makers.len() + result.trades.len());
        events.push(EngineEvent::OrderPlaced { order: placed });
        events.extend(
            result
                .updated_makers
                .iter()
                .cloned()
                .map(|order| EngineEvent::OrderUpdated { order }),
        );
        events.extend(
            result
                .trades
                .iter()
                .cloned()
                .map(|trade| EngineEvent::TradeExecuted { trade }),
        );
        if result.order.status() != OrderStatus::Pending {
            events.push(EngineEvent::OrderUpdated {
                order: result.order.clone(),
            });
        }
        events.push(EngineEvent::DepthChanged { depth });
        events.push(EngineEvent::TickerChanged { ticker });

        debug!(
            market = %market,
            order_id = %result.order.id,
            trades = result.trades.len(),
            events = events.len(),
            "order placed"
        );

        self.event_handler.on_events(events);
        Ok(result.order)
    }

    /// Cancel a resting order, searching every book.
    ///
    /// An unknown order, or one owned by another user, is `success: false`.
    pub fn cancel_order(&mut self, request: CancelOrderRequest) -> CancelOrderResponse {
        let levels = self.config.depth_levels;

        let mut cancelled = None;
        for book in self.books.iter_mut() {
            if let Some(order) = book.remove_order(request.order_id, request.user_id) {
                cancelled = Some((order, book.get_depth(levels), book.ticker_stats()));
                break;
            }
        }

        let Some((order, depth, ticker)) = cancelled else {
            info!(
                order_id = %request.order_id,
                user_id = %request.user_id,
                "cancel request matched no resting order"
            );
            return CancelOrderResponse {
                success: false,
                order_id: request.order_id,
                order: None,
            };
        };

        info!(order_id = %order.id, market = %order.market, "order cancelled");

        self.event_handler.on_events(vec![
            EngineEvent::OrderUpdated {
                order: order.clone(),
            },
            EngineEvent::DepthChanged { depth },
            EngineEvent::TickerChanged { ticker },
        ]);

        CancelOrderResponse {
            success: true,
            order_id: request.order_id,
            order: Some(order),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Depth ladder of a market, at most `levels` per side.
    ///
    /// `None` falls back to the configured `depth_levels`; 0 means unlimited.
    pub fn get_market_depth(&self, market: &str, levels: Option<usize>) -> EngineResult<MarketDepth> {
        let market: MarketId = market.parse()?;
        let levels = levels.unwrap_or(self.config.depth_levels);
        Ok(match self.books.get(&market) {
            Some(book) => book.get_depth(levels),
            None => MarketDepth::empty(market),
        })
    }

    /// Depth ladder as `[price, quantity]` string pairs
    pub fn get_depth(&self, market: &str, levels: Option<usize>) -> EngineResult<DepthResponse> {
        self.get_market_depth(market, levels)
            .map(|depth| depth.to_response())
    }

    /// Resting orders of `user_id` in one market, or in every market when
    /// `market` is absent or empty. `BASE_QUOTE` is accepted for `BASE/QUOTE`.
    pub fn get_open_orders(&self, user_id: UserId, market: Option<&str>) -> EngineResult<Vec<Order>> {
        match market.filter(|market| !market.is_empty()) {
            None => Ok(self
                .books
                .iter()
                .flat_map(|book| book.get_open_orders(user_id))
                .collect()),
            Some(market) => {
                let market = normalize_ticker(market).parse::<MarketId>()?;
                Ok(self
                    .books
                    .get(&market)
                    .map(|book| book.get_open_orders(user_id))
                    .unwrap_or_default())
            },
        }
    }

    /// Resting bid/ask counts per book, in creation order
    pub fn list_orderbooks(&self) -> OrderBooksResponse {
        let orderbooks: Vec<_> = self.books.iter().map(OrderBook::summary).collect();
        OrderBooksResponse {
            total_orderbooks: orderbooks.len(),
            orderbooks,
        }
    }

    pub fn ticker(&self, market: &str) -> EngineResult<TickerStats> {
        let market: MarketId = market.parse()?;
        Ok(match self.books.get(&market) {
            Some(book) => book.ticker_stats(),
            None => TickerStats::new(market, None, None, None),
        })
    }

    /// Configured markets, in configuration order
    pub fn markets(&self) -> &[Market] {
        &self.config.markets
    }

    pub fn market(&self, ticker: &str) -> Option<&Market> {
        let ticker: MarketId = normalize_ticker(ticker).parse().ok()?;
        self.config.markets.iter().find(|market| market.ticker == ticker)
    }
}

fn normalize_ticker(market: &str) -> String {
    if market.contains('/') {
        market.to_string()
    } else {
        market.replacen('_', "/", 1)
    }
}
