// ============================================================================
// Demo Liquidity Loader
// Deterministic resting ladders around a reference price per market
// ============================================================================

use super::matching_engine::MatchingEngine;
use super::requests::OrderRequest;
use crate::domain::{MarketId, Side, UserId};
use crate::error::EngineResult;
use crate::numeric::{parse_decimal, Price, Quantity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// Number of demo accounts the ladders are spread over
const DEMO_USERS: usize = 5;

/// Reference data for one seeded market
#[derive(Debug, Clone, Copy)]
pub struct MarketSeed {
    pub ticker: &'static str,
    /// Mid price the ladder is built around
    pub base_price: &'static str,
    /// Full spread as a fraction of the base price
    pub spread: &'static str,
    /// Price levels per side
    pub depth: usize,
}

pub const MARKET_SEEDS: &[MarketSeed] = &[
    MarketSeed {
        ticker: "BTC/USD",
        base_price: "111227.70",
        spread: "0.0002",
        depth: 50,
    },
    MarketSeed {
        ticker: "ETH/USD",
        base_price: "4296.38",
        spread: "0.0003",
        depth: 40,
    },
    MarketSeed {
        ticker: "USDT/USD",
        base_price: "1.0001",
        spread: "0.0001",
        depth: 30,
    },
    MarketSeed {
        ticker: "SOL/USD",
        base_price: "207.27",
        spread: "0.0004",
        depth: 35,
    },
    MarketSeed {
        ticker: "DOGE/USD",
        base_price: "0.23229",
        spread: "0.0005",
        depth: 25,
    },
    MarketSeed {
        ticker: "LINK/USD",
        base_price: "22.427",
        spread: "0.0003",
        depth: 30,
    },
    MarketSeed {
        ticker: "SUI/USD",
        base_price: "3.397",
        spread: "0.0004",
        depth: 25,
    },
    MarketSeed {
        ticker: "SHIB/USD",
        base_price: "0.00001255",
        spread: "0.0008",
        depth: 20,
    },
    MarketSeed {
        ticker: "RENDER/USD",
        base_price: "3.572",
        spread: "0.0005",
        depth: 20,
    },
    MarketSeed {
        ticker: "SEI/USD",
        base_price: "0.29544",
        spread: "0.0006",
        depth: 20,
    },
    MarketSeed {
        ticker: "ONDO/USD",
        base_price: "0.9155",
        spread: "0.0004",
        depth: 20,
    },
    MarketSeed {
        ticker: "WLD/USD",
        base_price: "1.2728",
        spread: "0.0005",
        depth: 20,
    },
    MarketSeed {
        ticker: "PENGU/USD",
        base_price: "0.03131",
        spread: "0.0008",
        depth: 15,
    },
    MarketSeed {
        ticker: "PEPE/USD",
        base_price: "0.00001001",
        spread: "0.0008",
        depth: 15,
    },
    MarketSeed {
        ticker: "APT/USD",
        base_price: "4.322",
        spread: "0.0005",
        depth: 20,
    },
    MarketSeed {
        ticker: "POL/USD",
        base_price: "0.2779",
        spread: "0.0006",
        depth: 20,
    },
    MarketSeed {
        ticker: "UNI/USD",
        base_price: "9.40",
        spread: "0.0004",
        depth: 25,
    },
    MarketSeed {
        ticker: "ENA/USD",
        base_price: "0.765",
        spread: "0.0005",
        depth: 20,
    },
    MarketSeed {
        ticker: "AAVE/USD",
        base_price: "299.59",
        spread: "0.0003",
        depth: 35,
    },
];

/// Lot size range for a base asset, as (min, max, scale) integer mantissas
fn lot_range(base: &str) -> (i64, i64, u32) {
    match base {
        "BTC" => (1_000, 150_000, 4),
        "ETH" => (1_000, 100_000, 3),
        "USDT" => (1_000, 500_000, 0),
        "SHIB" | "PEPE" => (10_000_000, 1_000_000_000, 0),
        "DOGE" => (10_000, 1_000_000, 0),
        "SOL" => (1_000, 100_000, 2),
        _ => (1_000, 500_000, 2),
    }
}

/// Rest a ladder of limit orders on both sides of every configured market
/// that has reference data. Orders go through [`MatchingEngine::create_order`]
/// only. Returns the number of orders placed.
pub fn seed_demo_liquidity(engine: &mut MatchingEngine, seed: u64) -> EngineResult<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let users: Vec<UserId> = (0..DEMO_USERS)
        .map(|_| UserId::from_uuid(Uuid::from_u128(rng.random())))
        .collect();

    let configured: Vec<MarketId> = engine
        .markets()
        .iter()
        .map(|market| market.ticker.clone())
        .collect();

    let mut total = 0;
    for market in configured {
        let Some(reference) = MARKET_SEEDS
            .iter()
            .find(|reference| reference.ticker == market.ticker())
        else {
            continue;
        };

        let placed = seed_market(engine, reference, &market, &users, &mut rng)?;
        info!(market = %market, levels = reference.depth, orders = placed, "seeded market");
        total += placed;
    }

    info!(orders = total, "demo liquidity loaded");
    Ok(total)
}

fn seed_market(
    engine: &mut MatchingEngine,
    seed: &MarketSeed,
    market: &MarketId,
    users: &[UserId],
    rng: &mut StdRng,
) -> EngineResult<usize> {
    let base_price = parse_decimal(seed.base_price)?;
    let half_spread = base_price * parse_decimal(seed.spread)? / Decimal::TWO;
    let best_bid = base_price - half_spread;
    let best_ask = base_price + half_spread;

    // 1bp from the touch, widening by 0.5bp per level
    let first_step = Decimal::new(1, 4);
    let step = Decimal::new(5, 5);
    let (min_lot, max_lot, scale) = lot_range(market.base());

    let mut placed = 0;
    for side in [Side::Buy, Side::Sell] {
        for level in 0..seed.depth {
            let offset = base_price * (first_step + step * Decimal::from(level));
            let price: Price = match side {
                Side::Buy => best_bid - offset,
                Side::Sell => best_ask + offset,
            }
            .normalize();

            for slot in 0..2 + level % 3 {
                let quantity: Quantity = Decimal::new(rng.random_range(min_lot..=max_lot), scale);
                let user_id = users[slot % users.len()];
                engine.create_order(OrderRequest::limit(
                    user_id,
                    market.ticker(),
                    side,
                    price,
                    quantity,
                ))?;
                placed += 1;
            }
        }
    }

    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngineConfig, Market};
    use crate::interfaces::NoOpEventHandler;
    use std::sync::Arc;

    fn engine_for(tickers: &[&str]) -> MatchingEngine {
        let markets = tickers
            .iter()
            .map(|ticker| Market::new(*ticker, ticker).unwrap())
            .collect();
        MatchingEngine::new(EngineConfig::new(markets), Arc::new(NoOpEventHandler)).unwrap()
    }

    #[test]
    fn test_seed_table_covers_default_markets() {
        let config = EngineConfig::default();
        for market in &config.markets {
            assert!(
                MARKET_SEEDS.iter().any(|seed| seed.ticker == market.ticker.ticker()),
                "no seed data for {}",
                market.ticker
            );
        }
    }

    #[test]
    fn test_ladder_shape() {
        let mut engine = engine_for(&["BTC/USD"]);
        let placed = seed_demo_liquidity(&mut engine, 42).unwrap();

        // 2 + (level % 3) orders on each of 50 levels, both sides
        assert_eq!(placed, 298);

        let listing = engine.list_orderbooks();
        let summary = &listing.orderbooks[0];
        assert_eq!(summary.bid_count, 149);
        assert_eq!(summary.ask_count, 149);

        let ticker = engine.ticker("BTC/USD").unwrap();
        assert!(ticker.best_bid.unwrap() < ticker.best_ask.unwrap());
        assert!(ticker.last_price.is_none());
    }

    #[test]
    fn test_seeding_is_deterministic() {
        let mut first = engine_for(&["ETH/USD", "SHIB/USD"]);
        let mut second = engine_for(&["ETH/USD", "SHIB/USD"]);

        seed_demo_liquidity(&mut first, 7).unwrap();
        seed_demo_liquidity(&mut second, 7).unwrap();

        for ticker in ["ETH/USD", "SHIB/USD"] {
            let a = first.get_market_depth(ticker, None).unwrap();
            let b = second.get_market_depth(ticker, None).unwrap();
            assert_eq!(a.bids, b.bids);
            assert_eq!(a.asks, b.asks);
        }
    }

    #[test]
    fn test_markets_without_reference_data_are_skipped() {
        let mut engine = engine_for(&["XRP/USD"]);
        assert_eq!(seed_demo_liquidity(&mut engine, 1).unwrap(), 0);
        assert_eq!(engine.list_orderbooks().orderbooks[0].bid_count, 0);
    }
}
