//! Request, outcome and settings types for the strategy workflows.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_trader_core::{AppConfig, PricingConfig, StrategyConfig};
use spread_trader_ib::{BracketAck, OrderAck, SecType};

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn from_config(pricing: &PricingConfig) -> Self {
        Self::new(pricing.retry_attempts, Duration::from_millis(pricing.retry_delay_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PricingConfig::default())
    }
}

/// Where a discovered price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Last,
    Midpoint,
    HistoricalClose,
    Model,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Last => write!(f, "last"),
            Self::Midpoint => write!(f, "midpoint"),
            Self::HistoricalClose => write!(f, "historical close"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// Outcome of price discovery. A zero price is `Found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceDiscovery {
    Found { price: Decimal, source: PriceSource },
    Unavailable,
}

impl PriceDiscovery {
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        match self {
            Self::Found { price, .. } => Some(*price),
            Self::Unavailable => None,
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<PriceSource> {
        match self {
            Self::Found { source, .. } => Some(*source),
            Self::Unavailable => None,
        }
    }
}

/// Which strike wins when two are equally distant from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    PreferHigher,
    PreferLower,
}

/// Multi-leg strategies the workflow can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    IronCondor,
    PutCreditSpread,
    CallCreditSpread,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IronCondor => write!(f, "iron condor"),
            Self::PutCreditSpread => write!(f, "put credit spread"),
            Self::CallCreditSpread => write!(f, "call credit spread"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "iron-condor" | "condor" => Ok(Self::IronCondor),
            "put-credit-spread" | "put-credit" => Ok(Self::PutCreditSpread),
            "call-credit-spread" | "call-credit" => Ok(Self::CallCreditSpread),
            other => anyhow::bail!("unknown strategy '{other}'"),
        }
    }
}

/// The instrument a strategy is written on.
///
/// Futures are resolved to the front month listing the requested expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingRequest {
    pub symbol: String,
    pub sec_type: SecType,
    pub exchange: String,
    pub currency: String,
    /// Futures multiplier (e.g., "50" for ES); ignored otherwise.
    pub multiplier: String,
}

impl UnderlyingRequest {
    pub fn index(symbol: &str, exchange: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            sec_type: SecType::Index,
            exchange: exchange.to_string(),
            currency: "USD".to_string(),
            multiplier: String::new(),
        }
    }

    pub fn future(symbol: &str, exchange: &str, multiplier: &str) -> Self {
        Self {
            sec_type: SecType::Future,
            multiplier: multiplier.to_string(),
            ..Self::index(symbol, exchange)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub kind: StrategyKind,
    pub underlying: UnderlyingRequest,
    /// Option expiry as `YYYYMMDD`.
    pub expiry: String,
    /// Transmit the order; otherwise it is staged untransmitted.
    pub live: bool,
}

/// Configuration slices the workflows read.
#[derive(Debug, Clone, Default)]
pub struct StrategySettings {
    pub strategy: StrategyConfig,
    pub pricing: PricingConfig,
}

impl From<&AppConfig> for StrategySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            strategy: config.strategy.clone(),
            pricing: config.pricing.clone(),
        }
    }
}

/// Strikes chosen for a strategy; unused sides are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikePlan {
    pub atm: Decimal,
    pub long_put: Option<Decimal>,
    pub short_put: Option<Decimal>,
    pub short_call: Option<Decimal>,
    pub long_call: Option<Decimal>,
}

/// What a strategy run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub kind: StrategyKind,
    pub underlying: String,
    pub underlying_price: Decimal,
    pub price_source: PriceSource,
    pub expiry: String,
    pub strikes: StrikePlan,
    pub combo: String,
    /// Rounded signed aggregate (positive = net credit).
    pub aggregate_price: Decimal,
    /// Limit sent with the BUY order (net debit).
    pub limit_price: Decimal,
    /// Legs priced without a usable source.
    pub unpriced_legs: Vec<String>,
    pub order: OrderAck,
}

/// Outcome of an adaptive bracket submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketReport {
    pub target: String,
    pub limit_price: Decimal,
    pub trailing_percent: Decimal,
    pub ack: BracketAck,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_price_is_found() {
        let found = PriceDiscovery::Found {
            price: dec!(0),
            source: PriceSource::Last,
        };
        assert_eq!(found.price(), Some(Decimal::ZERO));
        assert_eq!(PriceDiscovery::Unavailable.price(), None);
    }

    #[test]
    fn retry_policy_has_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(5));
        assert_eq!(policy.attempts, 1);
        assert_eq!(RetryPolicy::default().attempts, 3);
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("iron_condor".parse::<StrategyKind>().unwrap(), StrategyKind::IronCondor);
        assert_eq!(
            "Put Credit Spread".parse::<StrategyKind>().unwrap(),
            StrategyKind::PutCreditSpread
        );
        assert!("straddle".parse::<StrategyKind>().is_err());
    }
}
