//! Multi-leg options strategies on Interactive Brokers.
//!
//! Price discovery with retry and fallback, closest-strike search, combo
//! mid and model price aggregation with tick rounding, strategy builders,
//! order workflows and a position spread scan. Everything runs against the
//! [`Broker`](spread_trader_ib::Broker) traits, so the live client and the
//! paper broker are interchangeable.

pub mod combo_pricing;
pub mod discovery;
pub mod orders;
pub mod spreads;
pub mod strategies;
pub mod strikes;
pub mod tick;
pub mod types;
pub mod underlying;
pub mod workflow;

pub use combo_pricing::{aggregate_mid, combo_mid, model_combo_price, ComboMid, ComboPrice};
pub use discovery::{current_mid_price, discover_price};
pub use orders::Timeframe;
pub use spreads::{scan_spreads, CreditSpread, SpreadScan};
pub use strikes::{closest_strike, StrikeSelector};
pub use tick::round_to_tick;
pub use types::*;
pub use workflow::{run_bracket, run_strategy, BracketRequest};
