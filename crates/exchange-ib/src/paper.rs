//! In-memory paper broker.
//!
//! Holds a scripted book of contracts, quotes, chains and positions and fills
//! transmitted limit orders immediately at their limit price. Used to run the
//! strategy pipeline without touching IB Gateway.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::broker::{ContractResolver, MarketData, OrderRouter};
use crate::error::{IbError, Result};
use crate::types::{
    ContractSpec, ExecutionReport, OpenOrder, OptionChainParams, OrderAck, OrderKind,
    OrderStatus, OrderTarget, OrderTicket, PositionRecord, PriceBar, PriceQuote,
    QualifiedContract,
};

/// Per-contract commission charged on simulated fills.
const COMMISSION_PER_CONTRACT: Decimal = dec!(0.65);

const FIRST_ORDER_ID: i32 = 1001;

/// An order as the paper broker received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: i32,
    pub target: OrderTarget,
    pub ticket: OrderTicket,
}

#[derive(Debug, Default)]
struct QuoteScript {
    failures: usize,
    steps: VecDeque<PriceQuote>,
}

impl QuoteScript {
    /// Next scripted quote; the final step repeats forever.
    fn next(&mut self) -> Option<PriceQuote> {
        if self.steps.len() > 1 {
            self.steps.pop_front()
        } else {
            self.steps.front().cloned()
        }
    }
}

#[derive(Debug, Default)]
struct Book {
    contracts: Vec<QualifiedContract>,
    quotes: HashMap<i32, QuoteScript>,
    quote_requests: HashMap<i32, usize>,
    models: HashMap<i32, Decimal>,
    bars: HashMap<i32, Vec<PriceBar>>,
    chains: HashMap<i32, Vec<OptionChainParams>>,
    orders: Vec<PlacedOrder>,
    working: Vec<(PlacedOrder, OrderStatus)>,
    executions: Vec<ExecutionReport>,
    positions: Vec<PositionRecord>,
    next_con_id: i32,
    next_order_id: i32,
}

impl Book {
    fn fill(&mut self, placed: &PlacedOrder, price: Decimal) -> OrderAck {
        let quantity = Decimal::from(placed.ticket.quantity);
        let commission = COMMISSION_PER_CONTRACT * quantity;
        let (symbol, local_symbol) = match &placed.target {
            OrderTarget::Contract(contract) => {
                (contract.symbol().to_string(), contract.local_symbol.clone())
            }
            OrderTarget::Combo(combo) => (combo.symbol.clone(), String::new()),
        };

        self.executions.push(ExecutionReport {
            order_id: placed.order_id,
            execution_id: format!("PAPER-{}", placed.order_id),
            symbol,
            local_symbol,
            side: placed.ticket.action,
            shares: quantity,
            avg_price: price,
            time: Utc::now(),
        });

        info!(
            order_id = placed.order_id,
            target = %placed.target.display_name(),
            price = %price,
            quantity = placed.ticket.quantity,
            commission = %commission,
            "Paper fill simulated"
        );

        OrderAck {
            order_id: placed.order_id,
            status: OrderStatus::Filled,
            filled: quantity,
            avg_fill_price: Some(price),
        }
    }

    /// Fill a staged parent once its child transmits.
    fn release_parent(&mut self, parent_id: i32) {
        let Some(index) = self.working.iter().position(|(o, _)| o.order_id == parent_id) else {
            return;
        };
        let (parent, _) = self.working.remove(index);
        if let Some(price) = parent.ticket.limit_price() {
            self.fill(&parent, price);
        }
    }
}

fn spec_matches(candidate: &ContractSpec, query: &ContractSpec) -> bool {
    candidate.symbol == query.symbol
        && candidate.sec_type == query.sec_type
        && candidate.currency == query.currency
        && (query.exchange.is_empty() || candidate.exchange == query.exchange)
        && candidate.expiry.starts_with(&query.expiry)
        && query.strike.map_or(true, |s| candidate.strike == Some(s))
        && query.right.map_or(true, |r| candidate.right == Some(r))
}

/// Scripted broker for dry runs and tests.
#[derive(Debug, Default)]
pub struct PaperBroker {
    book: Mutex<Book>,
    readonly: bool,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Broker that refuses to place orders.
    pub fn readonly() -> Self {
        Self {
            readonly: true,
            ..Self::default()
        }
    }

    /// Add a contract to the book and return it with a fresh contract id.
    pub fn register(&self, spec: ContractSpec) -> QualifiedContract {
        let mut book = self.book.lock();
        book.next_con_id += 1;
        let contract = QualifiedContract::new(book.next_con_id, spec);
        book.contracts.push(contract.clone());
        contract
    }

    /// Every contract in the book.
    pub fn registered(&self) -> Vec<QualifiedContract> {
        self.book.lock().contracts.clone()
    }

    /// Always answer `contract` with `quote`.
    pub fn set_quote(&self, contract: &QualifiedContract, quote: PriceQuote) {
        self.script_quotes(contract, vec![quote]);
    }

    /// Answer successive quote requests from `steps`; the last step repeats.
    pub fn script_quotes(&self, contract: &QualifiedContract, steps: Vec<PriceQuote>) {
        let mut book = self.book.lock();
        let script = book.quotes.entry(contract.con_id).or_default();
        script.steps = steps.into();
    }

    /// Make the next `count` quote requests for `contract` fail.
    pub fn fail_next_quotes(&self, contract: &QualifiedContract, count: usize) {
        self.book.lock().quotes.entry(contract.con_id).or_default().failures += count;
    }

    pub fn set_model_price(&self, contract: &QualifiedContract, price: Decimal) {
        self.book.lock().models.insert(contract.con_id, price);
    }

    pub fn set_daily_bars(&self, contract: &QualifiedContract, bars: Vec<PriceBar>) {
        self.book.lock().bars.insert(contract.con_id, bars);
    }

    pub fn add_option_chain(&self, underlying: &QualifiedContract, chain: OptionChainParams) {
        self.book.lock().chains.entry(underlying.con_id).or_default().push(chain);
    }

    pub fn add_position(&self, position: PositionRecord) {
        self.book.lock().positions.push(position);
    }

    pub fn add_execution(&self, execution: ExecutionReport) {
        self.book.lock().executions.push(execution);
    }

    /// Every order received, in placement order.
    pub fn placed_orders(&self) -> Vec<PlacedOrder> {
        self.book.lock().orders.clone()
    }

    /// Number of quote requests made for `contract`.
    pub fn quote_requests(&self, contract: &QualifiedContract) -> usize {
        self.book
            .lock()
            .quote_requests
            .get(&contract.con_id)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContractResolver for PaperBroker {
    async fn contract_details(&self, spec: &ContractSpec) -> Result<Vec<QualifiedContract>> {
        let book = self.book.lock();
        let matches: Vec<QualifiedContract> = book
            .contracts
            .iter()
            .filter(|c| spec_matches(&c.spec, spec))
            .cloned()
            .collect();
        debug!(contract = %spec.display_name(), matches = matches.len(), "Paper contract lookup");
        Ok(matches)
    }

    async fn option_chain(
        &self,
        underlying: &QualifiedContract,
        exchange: &str,
    ) -> Result<Vec<OptionChainParams>> {
        let book = self.book.lock();
        Ok(book
            .chains
            .get(&underlying.con_id)
            .map(|chains| {
                chains
                    .iter()
                    .filter(|c| exchange.is_empty() || c.exchange == exchange)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl MarketData for PaperBroker {
    async fn quote(&self, contract: &QualifiedContract) -> Result<PriceQuote> {
        let mut book = self.book.lock();
        *book.quote_requests.entry(contract.con_id).or_default() += 1;

        let Some(script) = book.quotes.get_mut(&contract.con_id) else {
            return Err(IbError::NoData(contract.display_name()));
        };
        if script.failures > 0 {
            script.failures -= 1;
            return Err(IbError::Timeout(format!("quote for {}", contract.display_name())));
        }
        script
            .next()
            .ok_or_else(|| IbError::NoData(contract.display_name()))
    }

    async fn model_price(
        &self,
        contract: &QualifiedContract,
        _wait: Duration,
    ) -> Result<Option<Decimal>> {
        Ok(self.book.lock().models.get(&contract.con_id).copied())
    }

    async fn daily_bars(&self, contract: &QualifiedContract, days: u32) -> Result<Vec<PriceBar>> {
        let book = self.book.lock();
        let bars = book.bars.get(&contract.con_id).cloned().unwrap_or_default();
        let keep = usize::try_from(days).unwrap_or(usize::MAX);
        Ok(bars[bars.len().saturating_sub(keep)..].to_vec())
    }
}

#[async_trait]
impl OrderRouter for PaperBroker {
    async fn place_order(&self, target: &OrderTarget, ticket: &OrderTicket) -> Result<OrderAck> {
        if self.readonly {
            return Err(IbError::ReadOnly("place orders".into()));
        }

        let mut book = self.book.lock();
        if book.next_order_id == 0 {
            book.next_order_id = FIRST_ORDER_ID;
        }
        let order_id = book.next_order_id;
        book.next_order_id += 1;

        let placed = PlacedOrder {
            order_id,
            target: target.clone(),
            ticket: ticket.clone(),
        };
        book.orders.push(placed.clone());

        if ticket.transmit {
            if let Some(parent_id) = ticket.parent_id {
                book.release_parent(parent_id);
            }
        }

        let ack = match (&ticket.kind, ticket.transmit) {
            (OrderKind::Limit { price }, true) => book.fill(&placed, *price),
            (_, transmit) => {
                let status = if transmit {
                    OrderStatus::Submitted
                } else {
                    OrderStatus::PreSubmitted
                };
                book.working.push((placed, status.clone()));
                OrderAck {
                    order_id,
                    status,
                    filled: Decimal::ZERO,
                    avg_fill_price: None,
                }
            }
        };

        Ok(ack)
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
        let book = self.book.lock();
        Ok(book
            .working
            .iter()
            .map(|(placed, status)| OpenOrder {
                order_id: placed.order_id,
                symbol: placed.target.symbol().to_string(),
                action: placed.ticket.action,
                order_type: placed.ticket.kind.code().to_string(),
                quantity: Decimal::from(placed.ticket.quantity),
                limit_price: placed.ticket.limit_price(),
                status: status.clone(),
                order_ref: placed.ticket.order_ref.clone(),
            })
            .collect())
    }

    async fn executions(&self) -> Result<Vec<ExecutionReport>> {
        Ok(self.book.lock().executions.clone())
    }

    async fn positions(&self) -> Result<Vec<PositionRecord>> {
        Ok(self.book.lock().positions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, OptionRight};

    fn spx_put(broker: &PaperBroker, strike: Decimal) -> QualifiedContract {
        broker.register(ContractSpec::option("SPX", "20241108", strike, OptionRight::Put))
    }

    #[tokio::test]
    async fn qualify_matches_partial_expiry_and_strike() {
        let broker = PaperBroker::new();
        let es = broker.register(ContractSpec::future("ES", "CME", "20241220", "50"));
        spx_put(&broker, dec!(5800));
        spx_put(&broker, dec!(5805));

        let found = broker
            .qualify(&ContractSpec::future("ES", "CME", "202412", "50"))
            .await
            .unwrap();
        assert_eq!(found.con_id, es.con_id);

        let query = ContractSpec::chain_query(&ContractSpec::index("SPX", "SMART"), "20241108", None);
        let all = broker.contract_details(&query).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn scripted_quotes_repeat_last_step() {
        let broker = PaperBroker::new();
        let put = spx_put(&broker, dec!(5800));
        broker.fail_next_quotes(&put, 1);
        broker.script_quotes(
            &put,
            vec![PriceQuote::default(), PriceQuote::bid_ask(dec!(1.0), dec!(1.2))],
        );

        assert!(broker.quote(&put).await.is_err());
        assert!(broker.quote(&put).await.unwrap().is_empty());
        assert_eq!(broker.quote(&put).await.unwrap().midpoint(), Some(dec!(1.1)));
        assert_eq!(broker.quote(&put).await.unwrap().midpoint(), Some(dec!(1.1)));
        assert_eq!(broker.quote_requests(&put), 4);
    }

    #[tokio::test]
    async fn bracket_child_releases_parent() {
        let broker = PaperBroker::new();
        let put = spx_put(&broker, dec!(5800));
        let target = OrderTarget::Contract(put);

        let parent = OrderTicket::limit(Action::Buy, 2, dec!(3.1)).transmit(true);
        let child = OrderTicket::trailing_stop(Action::Sell, 2, dec!(10)).transmit(true);
        let ack = broker.place_bracket(&target, &parent, &child).await.unwrap();

        assert_eq!(ack.parent.status, OrderStatus::PreSubmitted);
        assert_eq!(ack.child.status, OrderStatus::Submitted);

        let executions = broker.executions().await.unwrap();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].order_id, ack.parent.order_id);

        let open = broker.open_orders().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].order_type, "TRAIL");
        assert_eq!(broker.placed_orders()[1].ticket.parent_id, Some(ack.parent.order_id));
    }

    #[tokio::test]
    async fn readonly_refuses_orders() {
        let broker = PaperBroker::readonly();
        let put = spx_put(&broker, dec!(5800));
        let ticket = OrderTicket::limit(Action::Sell, 1, dec!(1)).transmit(true);
        let err = broker
            .place_order(&OrderTarget::Contract(put), &ticket)
            .await
            .unwrap_err();
        assert!(matches!(err, IbError::ReadOnly(_)));
        assert!(broker.placed_orders().is_empty());
    }
}
