//! CLI commands for the spread trader.

pub mod bracket;
pub mod front_month;
pub mod orders;
pub mod price;
pub mod session;
pub mod spreads;
pub mod strategy;

pub use bracket::{run_bracket_command, BracketArgs};
pub use front_month::{run_front_month, FrontMonthArgs};
pub use orders::{run_orders, OrdersArgs};
pub use price::{run_price, PriceArgs};
pub use session::load_config;
pub use spreads::{run_spreads, SpreadsArgs};
pub use strategy::{run_strategy_command, StrategyArgs};
