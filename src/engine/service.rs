// ============================================================================
// Engine Service
// Single sequential consumer of engine requests, with bounded reply waits
// ============================================================================

use super::matching_engine::MatchingEngine;
use super::requests::{
    CancelOrderRequest, CancelOrderResponse, EngineRequest, EngineResponse, OrderBooksResponse,
    OrderRequest,
};
use crate::domain::{DepthResponse, Market, Order, TickerStats, UserId};
use crate::error::{EngineError, EngineResult};
use crossbeam::channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

impl MatchingEngine {
    /// Run one request to completion
    pub fn handle(&mut self, request: EngineRequest) -> EngineResult<EngineResponse> {
        Ok(match request {
            EngineRequest::CreateOrder(request) => {
                EngineResponse::OrderPlaced(self.create_order(request)?)
            },
            EngineRequest::CancelOrder(request) => {
                EngineResponse::OrderCancelled(self.cancel_order(request))
            },
            EngineRequest::GetDepth { market, levels } => {
                EngineResponse::Depth(self.get_depth(&market, levels)?)
            },
            EngineRequest::GetOpenOrders { user_id, market } => {
                EngineResponse::OpenOrders(self.get_open_orders(user_id, market.as_deref())?)
            },
            EngineRequest::GetTicker { market } => EngineResponse::Ticker(self.ticker(&market)?),
            EngineRequest::ListOrderbooks => EngineResponse::Orderbooks(self.list_orderbooks()),
            EngineRequest::GetMarkets => EngineResponse::Markets(self.markets().to_vec()),
            EngineRequest::Shutdown => EngineResponse::ShuttingDown,
        })
    }
}

struct Envelope {
    request: EngineRequest,
    reply: Sender<EngineResult<EngineResponse>>,
}

// ============================================================================
// Service
// ============================================================================

/// Owns the thread that drains the request queue.
///
/// Requests from every handle are processed one at a time, in arrival order;
/// reads go through the same queue as writes.
pub struct EngineService {
    handle: EngineHandle,
    worker: JoinHandle<MatchingEngine>,
}

impl EngineService {
    /// Move `engine` onto a dedicated thread
    pub fn spawn(engine: MatchingEngine) -> EngineResult<Self> {
        let timeout = engine.config().reply_timeout;
        let (requests, inbox) = unbounded();

        let worker = thread::Builder::new()
            .name("matching-engine".to_string())
            .spawn(move || run(engine, inbox))
            .map_err(|err| EngineError::Spawn(err.to_string()))?;

        Ok(Self {
            handle: EngineHandle { requests, timeout },
            worker,
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop after every request queued so far and hand the engine back
    pub fn shutdown(self) -> EngineResult<MatchingEngine> {
        if let Err(err) = self.handle.call(EngineRequest::Shutdown) {
            warn!(error = %err, "shutdown request not acknowledged");
        }
        drop(self.handle);

        self.worker.join().map_err(|_| EngineError::Disconnected)
    }
}

fn run(mut engine: MatchingEngine, inbox: Receiver<Envelope>) -> MatchingEngine {
    info!("engine service started");

    for Envelope { request, reply } in inbox.iter() {
        let stop = matches!(request, EngineRequest::Shutdown);
        let response = engine.handle(request);

        if reply.send(response).is_err() {
            warn!("caller stopped waiting before the reply was ready");
        }
        if stop {
            break;
        }
    }

    info!("engine service stopped");
    engine
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable request/reply client of an [`EngineService`].
///
/// A call that times out fails with [`EngineError::Timeout`] but may still be
/// applied by the engine.
#[derive(Clone)]
pub struct EngineHandle {
    requests: Sender<Envelope>,
    timeout: Duration,
}

impl EngineHandle {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Enqueue a request and wait for its reply
    pub fn call(&self, request: EngineRequest) -> EngineResult<EngineResponse> {
        let (reply, response) = bounded(1);
        self.requests
            .send(Envelope { request, reply })
            .map_err(|_| EngineError::Disconnected)?;

        match response.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout = ?self.timeout, "engine reply timed out");
                Err(EngineError::Timeout(self.timeout))
            },
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
        }
    }

    pub fn place_order(&self, request: OrderRequest) -> EngineResult<Order> {
        match self.call(EngineRequest::CreateOrder(request))? {
            EngineResponse::OrderPlaced(order) => Ok(order),
            other => Err(unexpected(other)),
        }
    }

    pub fn cancel_order(&self, request: CancelOrderRequest) -> EngineResult<CancelOrderResponse> {
        match self.call(EngineRequest::CancelOrder(request))? {
            EngineResponse::OrderCancelled(response) => Ok(response),
            other => Err(unexpected(other)),
        }
    }

    /// Depth of `market`, `levels` per side or the engine's configured default
    pub fn get_depth(&self, market: impl Into<String>, levels: Option<usize>) -> EngineResult<DepthResponse> {
        match self.call(EngineRequest::GetDepth {
            market: market.into(),
            levels,
        })? {
            EngineResponse::Depth(depth) => Ok(depth),
            other => Err(unexpected(other)),
        }
    }

    pub fn get_open_orders(&self, user_id: UserId, market: Option<String>) -> EngineResult<Vec<Order>> {
        match self.call(EngineRequest::GetOpenOrders { user_id, market })? {
            EngineResponse::OpenOrders(orders) => Ok(orders),
            other => Err(unexpected(other)),
        }
    }

    pub fn ticker(&self, market: impl Into<String>) -> EngineResult<TickerStats> {
        match self.call(EngineRequest::GetTicker {
            market: market.into(),
        })? {
            EngineResponse::Ticker(ticker) => Ok(ticker),
            other => Err(unexpected(other)),
        }
    }

    pub fn list_orderbooks(&self) -> EngineResult<OrderBooksResponse> {
        match self.call(EngineRequest::ListOrderbooks)? {
            EngineResponse::Orderbooks(listing) => Ok(listing),
            other => Err(unexpected(other)),
        }
    }

    pub fn markets(&self) -> EngineResult<Vec<Market>> {
        match self.call(EngineRequest::GetMarkets)? {
            EngineResponse::Markets(markets) => Ok(markets),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: EngineResponse) -> EngineError {
    EngineError::UnexpectedResponse(format!("{response:?}"))
}
