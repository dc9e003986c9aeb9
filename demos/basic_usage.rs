// ============================================================================
// Basic Usage Example
// ============================================================================

use rust_decimal::Decimal;
use spot_matching_engine::prelude::*;
use spot_matching_engine::utils::init_logging;
use std::sync::Arc;

fn main() -> EngineResult<()> {
    init_logging(tracing::Level::INFO)?;

    println!("=== Spot Matching Engine Example ===\n");

    // Engine with the default markets, seeded with demo liquidity
    let engine = MatchingEngineBuilder::new()
        .with_demo_liquidity(42)
        .build(Arc::new(LoggingEventHandler))?;

    let service = EngineService::spawn(engine)?;
    let handle = service.handle();

    println!("Order books:");
    for book in handle.list_orderbooks()?.orderbooks {
        println!("  {:<12} bids: {:>4}  asks: {:>4}", book.ticker, book.bid_count, book.ask_count);
    }

    let ticker = handle.ticker("BTC/USD")?;
    println!("\n=== BTC/USD Ticker ===");
    println!("Best bid: {:?}", ticker.best_bid);
    println!("Best ask: {:?}", ticker.best_ask);
    println!("Spread:   {:?} ({:?}%)", ticker.spread, ticker.spread_percent);

    // Rest a bid inside the spread, then take liquidity with a market order
    let trader = UserId::new();
    let bid = handle.place_order(OrderRequest::limit(
        trader,
        "BTC/USD",
        Side::Buy,
        Decimal::from(111_200),
        Decimal::new(25, 2),
    ))?;
    println!("\nResting bid {} status {:?}", bid.id, bid.status());

    println!("\n=== Submitting Market Order ===");
    let order = handle.place_order(OrderRequest::market(
        trader,
        "BTC/USD",
        Side::Buy,
        Decimal::from(20),
    ))?;

    println!("Status: {:?}, filled {}", order.status(), order.filled_quantity());
    for trade in &order.trades {
        println!("  Trade: {} @ {} (qty: {})", trade.id, trade.price, trade.quantity);
    }

    // Cancel the resting bid
    let cancelled = handle.cancel_order(CancelOrderRequest {
        user_id: trader,
        order_id: bid.id,
    })?;
    println!("\nCancelled resting bid: {}", cancelled.success);

    // Final depth
    println!("\n=== Final BTC/USD Depth (5 levels) ===");
    let depth = handle.get_depth("BTC/USD", Some(5))?;
    println!("Bids:");
    for [price, quantity] in &depth.bids {
        println!("  {} @ {}", quantity, price);
    }
    println!("Asks:");
    for [price, quantity] in &depth.asks {
        println!("  {} @ {}", quantity, price);
    }

    service.shutdown()?;
    Ok(())
}
