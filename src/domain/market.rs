// ============================================================================
// Market Identity
// ============================================================================

use crate::error::{EngineError, EngineResult};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Canonical market identifier, rendered as `BASE/QUOTE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct MarketId {
    base: String,
    quote: String,
}

impl MarketId {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> EngineResult<Self> {
        let base = base.into();
        let quote = quote.into();
        if !Self::is_valid_asset(&base) || !Self::is_valid_asset(&quote) {
            return Err(EngineError::InvalidMarket(format!("{base}/{quote}")));
        }
        Ok(Self { base, quote })
    }

    /// Asset being bought or sold
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Asset the price is expressed in
    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn ticker(&self) -> String {
        self.to_string()
    }

    fn is_valid_asset(asset: &str) -> bool {
        !asset.is_empty() && !asset.contains('/') && !asset.chars().any(char::is_whitespace)
    }
}

impl FromStr for MarketId {
    type Err = EngineError;

    /// Exactly two non-empty parts separated by a single `/`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) => {
                Self::new(base, quote).map_err(|_| EngineError::InvalidMarket(s.to_string()))
            },
            _ => Err(EngineError::InvalidMarket(s.to_string())),
        }
    }
}

impl TryFrom<String> for MarketId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarketId> for String {
    fn from(market: MarketId) -> Self {
        market.to_string()
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A tradable market as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Market {
    pub name: String,
    pub ticker: MarketId,
}

impl Market {
    pub fn new(name: impl Into<String>, ticker: &str) -> EngineResult<Self> {
        Ok(Self {
            name: name.into(),
            ticker: ticker.parse()?,
        })
    }
}

/// (display name, ticker) for every market the venue lists by default.
pub const DEFAULT_MARKETS: &[(&str, &str)] = &[
    ("Bitcoin", "BTC/USD"),
    ("Ethereum", "ETH/USD"),
    ("USDT", "USDT/USD"),
    ("Solana", "SOL/USD"),
    ("Dogecoin", "DOGE/USD"),
    ("Chainlink", "LINK/USD"),
    ("Sui", "SUI/USD"),
    ("Shiba Inu", "SHIB/USD"),
    ("Render", "RENDER/USD"),
    ("Sei", "SEI/USD"),
    ("Ondo", "ONDO/USD"),
    ("Worldcoin", "WLD/USD"),
    ("Pudgy Penguins", "PENGU/USD"),
    ("Pepe", "PEPE/USD"),
    ("Aptos", "APT/USD"),
    ("POL (ex-MATIC)", "POL/USD"),
    ("Uniswap", "UNI/USD"),
    ("Ethena", "ENA/USD"),
    ("Aave", "AAVE/USD"),
];

pub fn default_markets() -> Vec<Market> {
    DEFAULT_MARKETS
        .iter()
        .filter_map(|(name, ticker)| Market::new(*name, ticker).ok())
        .collect()
}
