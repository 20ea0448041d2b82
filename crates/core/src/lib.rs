//! Shared configuration for the spread trader workspace.
//!
//! Settings are layered with `figment`: `config/Config.toml`, an optional
//! profile file, then `SPREAD_`-prefixed environment variables.

pub mod config;
pub mod config_loader;

pub use config::{AppConfig, IbConfig, PricingConfig, RoundingMode, StrategyConfig};
pub use config_loader::{ConfigLoader, ENV_PREFIX};
