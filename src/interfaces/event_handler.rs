// ============================================================================
// Event Handler Interface
// Notifications emitted by the engine for downstream consumers
// ============================================================================

use crate::domain::{MarketDepth, Order, TickerStats, Trade};
use crossbeam::channel::Sender;
use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the matching engine.
///
/// These are notifications only: the engine's own state is authoritative and
/// dropping or delaying an event never corrupts a book.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum EngineEvent {
    /// Order accepted, in its state before matching
    OrderPlaced { order: Order },

    /// Fill or cancellation changed an order
    OrderUpdated { order: Order },

    /// Trade generated by a match
    TradeExecuted { trade: Trade },

    /// Resting liquidity of a market changed
    DepthChanged { depth: MarketDepth },

    /// Best bid/ask of a market recomputed
    TickerChanged { ticker: TickerStats },
}

impl EngineEvent {
    /// Publication topic for the event
    pub fn topic(&self) -> String {
        match self {
            EngineEvent::OrderPlaced { .. } => "order.placed".to_string(),
            EngineEvent::OrderUpdated { .. } => "order.updated".to_string(),
            EngineEvent::TradeExecuted { .. } => "trade.executed".to_string(),
            EngineEvent::DepthChanged { depth } => format!("depth.{}", depth.market),
            EngineEvent::TickerChanged { ticker } => format!("ticker.{}", ticker.market),
        }
    }

    /// JSON payload for the messaging boundary
    #[cfg(feature = "serde")]
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Event handler trait for processing matching engine events
/// Implementations can handle persistence projection, fan-out, logging, etc.
pub trait EventHandler: Send + Sync {
    /// Handle an engine event
    fn on_event(&self, event: EngineEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: EngineEvent) {}
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: EngineEvent) {
        tracing::debug!(topic = %event.topic(), "engine event: {:?}", event);
    }
}

/// Forwards events to a channel drained by a publisher outside the engine.
///
/// A disconnected receiver drops events; matching carries on regardless.
pub struct ChannelEventHandler {
    sender: Sender<EngineEvent>,
}

impl ChannelEventHandler {
    pub fn new(sender: Sender<EngineEvent>) -> Self {
        Self { sender }
    }
}

impl EventHandler for ChannelEventHandler {
    fn on_event(&self, event: EngineEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::warn!(topic = %err.0.topic(), "event receiver gone, dropping event");
        }
    }
}

/// Keeps every event in memory
#[derive(Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().clone()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventHandler for RecordingEventHandler {
    fn on_event(&self, event: EngineEvent) {
        self.events.lock().push(event);
    }

    fn on_events(&self, events: Vec<EngineEvent>) {
        self.events.lock().extend(events);
    }
}
