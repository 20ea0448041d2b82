use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ib: IbConfig,
    pub strategy: StrategyConfig,
    pub pricing: PricingConfig,
}

/// IB Gateway/TWS connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IbConfig {
    /// Gateway/TWS host (use 127.0.0.1; TWS may reject IPv6 localhost).
    pub host: String,
    /// Gateway port (4001 = live, 4002 = paper).
    pub port: u16,
    /// Client ID (unique per connection).
    pub client_id: i32,
    /// Refuse to place orders from this session.
    pub readonly: bool,
    /// Connection attempts before giving up.
    pub connect_attempts: u32,
    /// Seconds between connection attempts.
    pub connect_retry_secs: u64,
    /// Upper bound on a single market data snapshot.
    pub snapshot_timeout_ms: u64,
}

impl Default for IbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4002, // Paper trading by default
            client_id: 100,
            readonly: false,
            connect_attempts: 5,
            connect_retry_secs: 2,
            snapshot_timeout_ms: 2_000,
        }
    }
}

impl IbConfig {
    /// Paper trading configuration.
    pub fn paper() -> Self {
        Self::default()
    }

    /// Live trading configuration.
    pub fn live() -> Self {
        Self {
            port: 4001,
            ..Self::default()
        }
    }

    /// Connection URL for ibapi crate.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Strike placement and order defaults for the spread strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Written to every order's `orderRef` so fills can be attributed.
    pub tag: String,
    /// Distance below the underlying price for the protective put.
    pub long_put_width: Decimal,
    /// Distance above the underlying price for the protective call.
    pub long_call_width: Decimal,
    /// Distance below the underlying price for the short put (0 = ATM).
    pub short_put_offset: Decimal,
    /// Distance above the underlying price for the short call (0 = ATM).
    pub short_call_offset: Decimal,
    pub quantity: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            tag: "spread-trader".to_string(),
            long_put_width: Decimal::from(75),
            long_call_width: Decimal::from(75),
            short_put_offset: Decimal::ZERO,
            short_call_offset: Decimal::ZERO,
            quantity: 1,
        }
    }
}

/// How prices are rounded onto the tick grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Banker's rounding: ties go to the even tick.
    #[default]
    HalfEven,
    /// Ties go away from zero.
    HalfAwayFromZero,
}

/// Price discovery and combo pricing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Quote attempts before falling back to historical bars.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Bounded wait for a model (theoretical) option price.
    pub model_wait_ms: u64,
    /// Days of daily bars requested for the close fallback.
    pub history_days: u32,
    pub rounding: RoundingMode,
    /// Tick used for symbols missing from `tick_sizes`.
    pub default_tick: Decimal,
    pub tick_sizes: BTreeMap<String, Decimal>,
    /// Price combos from model prices instead of bid/ask mids.
    pub use_model_price: bool,
    /// Submit even when some legs could not be priced.
    pub allow_partial_pricing: bool,
    /// Strikes probed for a usable quote when filtering by quote.
    pub max_quote_probes: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let mut tick_sizes = BTreeMap::new();
        tick_sizes.insert("ES".to_string(), Decimal::new(5, 2));
        tick_sizes.insert("SPX".to_string(), Decimal::new(10, 2));

        Self {
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            model_wait_ms: 2_000,
            history_days: 5,
            rounding: RoundingMode::default(),
            default_tick: Decimal::new(1, 2),
            tick_sizes,
            use_model_price: true,
            allow_partial_pricing: false,
            max_quote_probes: 8,
        }
    }
}

impl PricingConfig {
    /// Minimum price increment for a symbol.
    #[must_use]
    pub fn tick_size_for(&self, symbol: &str) -> Decimal {
        self.tick_sizes
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.default_tick)
    }
}
