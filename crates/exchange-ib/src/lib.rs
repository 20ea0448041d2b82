//! Interactive Brokers integration for multi-leg options strategies.
//!
//! Provides IB Gateway/TWS connectivity, contract qualification, quote
//! snapshots, order placement and account queries behind the traits in
//! [`broker`], plus an in-memory [`PaperBroker`] implementing the same traits.

pub mod account;
pub mod broker;
pub mod client;
pub mod contracts;
mod convert;
pub mod error;
pub mod execution;
pub mod market_data;
pub mod paper;
pub mod types;

pub use broker::{Broker, ContractResolver, MarketData, OrderRouter};
pub use client::{IBClient, IbConfig};
pub use error::{IbError, Result};
pub use paper::{PaperBroker, PlacedOrder};
pub use types::*;
