//! Broker capabilities used by the strategy code.
//!
//! Implemented by [`IBClient`](crate::client::IBClient) for live sessions and
//! by [`PaperBroker`](crate::paper::PaperBroker) for dry runs and tests.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{IbError, Result};
use crate::types::{
    BracketAck, ContractSpec, ExecutionReport, OpenOrder, OptionChainParams, OrderAck,
    OrderTarget, OrderTicket, PositionRecord, PriceBar, PriceQuote, QualifiedContract,
};

/// Contract lookup and qualification.
#[async_trait]
pub trait ContractResolver: Send + Sync {
    /// All contracts matching a (possibly partial) descriptor.
    async fn contract_details(&self, spec: &ContractSpec) -> Result<Vec<QualifiedContract>>;

    /// Option chain parameters for an underlying.
    async fn option_chain(
        &self,
        underlying: &QualifiedContract,
        exchange: &str,
    ) -> Result<Vec<OptionChainParams>>;

    /// Resolve a descriptor to exactly one contract.
    async fn qualify(&self, spec: &ContractSpec) -> Result<QualifiedContract> {
        spec.validate()?;
        debug!(contract = %spec.display_name(), "Qualifying contract");
        let matches = self.contract_details(spec).await?;
        unique_match(spec, matches)
    }
}

/// Quotes, model prices and historical bars.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// One market data snapshot.
    async fn quote(&self, contract: &QualifiedContract) -> Result<PriceQuote>;

    /// Theoretical option price, waiting at most `wait` for it to arrive.
    async fn model_price(&self, contract: &QualifiedContract, wait: Duration)
        -> Result<Option<Decimal>>;

    /// Daily bars covering the last `days` days, oldest first.
    async fn daily_bars(&self, contract: &QualifiedContract, days: u32) -> Result<Vec<PriceBar>>;
}

/// Order placement and account queries.
#[async_trait]
pub trait OrderRouter: Send + Sync {
    async fn place_order(&self, target: &OrderTarget, ticket: &OrderTicket) -> Result<OrderAck>;

    /// Place `parent` untransmitted, then `child` linked to it.
    ///
    /// The child's `transmit` flag releases both orders together.
    async fn place_bracket(
        &self,
        target: &OrderTarget,
        parent: &OrderTicket,
        child: &OrderTicket,
    ) -> Result<BracketAck> {
        let staged = parent.clone().transmit(false);
        let parent_ack = self.place_order(target, &staged).await?;
        let linked = child.clone().child_of(parent_ack.order_id);
        let child_ack = self.place_order(target, &linked).await?;
        Ok(BracketAck {
            parent: parent_ack,
            child: child_ack,
        })
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>>;

    async fn executions(&self) -> Result<Vec<ExecutionReport>>;

    async fn positions(&self) -> Result<Vec<PositionRecord>>;
}

/// Everything a strategy run needs from a broker.
pub trait Broker: ContractResolver + MarketData + OrderRouter {}

impl<T: ContractResolver + MarketData + OrderRouter> Broker for T {}

fn unique_match(spec: &ContractSpec, mut matches: Vec<QualifiedContract>) -> Result<QualifiedContract> {
    match matches.len() {
        0 => Err(IbError::qualification(spec.display_name())),
        1 => Ok(matches.remove(0)),
        n => Err(IbError::ambiguous(spec.display_name(), n)),
    }
}
