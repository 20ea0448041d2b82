//! Core types for IB options trading.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{IbError, Result};

/// Value IB sends in price ticks when it has no data.
pub const NO_DATA_SENTINEL: f64 = -1.0;

/// Convert a raw broker price into a usable `Decimal`.
///
/// NaN, infinities and the `-1` sentinel are rejected; zero is a valid price.
#[must_use]
pub fn usable_price(raw: f64) -> Option<Decimal> {
    if !raw.is_finite() || raw == NO_DATA_SENTINEL {
        return None;
    }
    Decimal::from_f64(raw).map(|d| d.normalize())
}

/// Security type of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecType {
    Stock,
    Future,
    Option,
    FutureOption,
    Index,
    /// Multi-leg combo (IB "BAG").
    Combo,
}

impl SecType {
    /// IB security type code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Stock => "STK",
            Self::Future => "FUT",
            Self::Option => "OPT",
            Self::FutureOption => "FOP",
            Self::Index => "IND",
            Self::Combo => "BAG",
        }
    }

    /// Security type of options written on this underlying.
    #[must_use]
    pub const fn derivative(self) -> Self {
        match self {
            Self::Future => Self::FutureOption,
            _ => Self::Option,
        }
    }

    #[must_use]
    pub const fn is_option(self) -> bool {
        matches!(self, Self::Option | Self::FutureOption)
    }
}

impl fmt::Display for SecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SecType {
    type Err = IbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "STK" => Ok(Self::Stock),
            "FUT" => Ok(Self::Future),
            "OPT" => Ok(Self::Option),
            "FOP" => Ok(Self::FutureOption),
            "IND" => Ok(Self::Index),
            "BAG" => Ok(Self::Combo),
            other => Err(IbError::InvalidContract(format!(
                "unsupported security type '{other}', expected STK, FUT, FOP, OPT or IND"
            ))),
        }
    }
}

/// Options contract right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

impl FromStr for OptionRight {
    type Err = IbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" | "CALL" => Ok(Self::Call),
            "P" | "PUT" => Ok(Self::Put),
            other => Err(IbError::InvalidContract(format!("unknown option right '{other}'"))),
        }
    }
}

/// Order / leg side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// Contribution sign in combo aggregation: sold legs count +1, bought legs -1.
    #[must_use]
    pub fn sign(self) -> Decimal {
        match self {
            Self::Sell => Decimal::ONE,
            Self::Buy => Decimal::NEGATIVE_ONE,
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Action {
    type Err = IbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "BOT" => Ok(Self::Buy),
            "SELL" | "SLD" => Ok(Self::Sell),
            other => Err(IbError::Api(format!("unknown action '{other}'"))),
        }
    }
}

/// Contract descriptor. Has no identity until the broker qualifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub symbol: String,
    pub sec_type: SecType,
    /// Last trade date (`YYYYMMDD`) or contract month (`YYYYMM`); empty when not applicable.
    pub expiry: String,
    pub strike: Option<Decimal>,
    pub right: Option<OptionRight>,
    /// Exchange routing (e.g., "SMART", "CBOE", "CME").
    pub exchange: String,
    pub currency: String,
    /// Contract multiplier as IB reports it (e.g., "50" for ES); empty when not set.
    pub multiplier: String,
}

impl ContractSpec {
    fn base(symbol: &str, sec_type: SecType, exchange: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            sec_type,
            expiry: String::new(),
            strike: None,
            right: None,
            exchange: exchange.to_string(),
            currency: "USD".to_string(),
            multiplier: String::new(),
        }
    }

    pub fn stock(symbol: &str) -> Self {
        Self::base(symbol, SecType::Stock, "SMART")
    }

    /// Index contract (e.g., SPX on CBOE).
    pub fn index(symbol: &str, exchange: &str) -> Self {
        Self::base(symbol, SecType::Index, exchange)
    }

    /// Future for a given contract month or last trade date.
    pub fn future(symbol: &str, exchange: &str, expiry: &str, multiplier: &str) -> Self {
        Self {
            expiry: expiry.to_string(),
            multiplier: multiplier.to_string(),
            ..Self::base(symbol, SecType::Future, exchange)
        }
    }

    /// Standard SMART-routed equity/index option.
    pub fn option(symbol: &str, expiry: &str, strike: Decimal, right: OptionRight) -> Self {
        Self {
            expiry: expiry.to_string(),
            strike: Some(strike),
            right: Some(right),
            ..Self::base(symbol, SecType::Option, "SMART")
        }
    }

    /// Generic descriptor from loosely typed inputs, as accepted on the command line.
    pub fn from_parts(symbol: &str, sec_type: SecType, exchange: &str, currency: &str) -> Self {
        Self {
            currency: currency.to_uppercase(),
            ..Self::base(symbol, sec_type, exchange)
        }
    }

    /// Option on `underlying`, inheriting its exchange, currency and multiplier.
    #[must_use]
    pub fn option_on(underlying: &Self, expiry: &str, strike: Decimal, right: OptionRight) -> Self {
        Self {
            expiry: expiry.to_string(),
            strike: Some(strike),
            right: Some(right),
            ..Self::chain_query(underlying, expiry, Some(right))
        }
    }

    /// Partial option descriptor (no strike) used to list strikes for an expiry.
    #[must_use]
    pub fn chain_query(underlying: &Self, expiry: &str, right: Option<OptionRight>) -> Self {
        Self {
            symbol: underlying.symbol.clone(),
            sec_type: underlying.sec_type.derivative(),
            expiry: expiry.to_string(),
            strike: None,
            right,
            exchange: underlying.exchange.clone(),
            currency: underlying.currency.clone(),
            multiplier: underlying.multiplier.clone(),
        }
    }

    #[must_use]
    pub fn with_exchange(mut self, exchange: &str) -> Self {
        self.exchange = exchange.to_string();
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_uppercase();
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: &str) -> Self {
        self.expiry = expiry.to_string();
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: &str) -> Self {
        self.multiplier = multiplier.to_string();
        self
    }

    /// Check the fields required for qualification are present.
    ///
    /// # Errors
    ///
    /// Returns `InvalidContract` naming the missing fields.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(IbError::InvalidContract("symbol must be provided".into()));
        }
        match self.sec_type {
            SecType::Future if self.expiry.is_empty() => Err(IbError::InvalidContract(
                "expiry (contract month) must be provided for future contracts".into(),
            )),
            SecType::Option | SecType::FutureOption
                if self.expiry.is_empty() || self.strike.is_none() || self.right.is_none() =>
            {
                Err(IbError::InvalidContract(format!(
                    "expiry, strike and right must be provided for {} contracts",
                    self.sec_type
                )))
            }
            SecType::Combo => Err(IbError::InvalidContract(
                "combo contracts are built from qualified legs, not qualified directly".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Human-readable description (e.g., "SPX OPT 20241108 5800P @CBOE").
    pub fn display_name(&self) -> String {
        let mut name = format!("{} {}", self.symbol, self.sec_type);
        if !self.expiry.is_empty() {
            name.push(' ');
            name.push_str(&self.expiry);
        }
        if let Some(strike) = self.strike {
            name.push(' ');
            name.push_str(&strike.normalize().to_string());
        }
        if let Some(right) = self.right {
            name.push_str(&right.to_string());
        }
        if !self.exchange.is_empty() {
            name.push_str(" @");
            name.push_str(&self.exchange);
        }
        name
    }
}

/// A contract the broker resolved to a unique contract id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedContract {
    pub con_id: i32,
    pub spec: ContractSpec,
    pub local_symbol: String,
    pub trading_class: String,
}

impl QualifiedContract {
    pub fn new(con_id: i32, spec: ContractSpec) -> Self {
        Self {
            con_id,
            spec,
            local_symbol: String::new(),
            trading_class: String::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.spec.symbol
    }

    pub fn strike(&self) -> Option<Decimal> {
        self.spec.strike
    }

    pub fn display_name(&self) -> String {
        format!("{} #{}", self.spec.display_name(), self.con_id)
    }
}

/// One leg of a multi-leg strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyLeg {
    pub contract: QualifiedContract,
    pub action: Action,
    /// Positive quantity multiplier for this leg.
    pub ratio: u32,
}

impl StrategyLeg {
    pub fn new(contract: QualifiedContract, action: Action, ratio: u32) -> Self {
        Self {
            contract,
            action,
            ratio,
        }
    }

    /// Signed, ratio-weighted multiplier applied to this leg's price.
    #[must_use]
    pub fn weight(&self) -> Decimal {
        self.action.sign() * Decimal::from(self.ratio)
    }
}

/// Multi-leg combo (IB "BAG") on a single underlying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub symbol: String,
    pub currency: String,
    pub exchange: String,
    pub legs: Vec<StrategyLeg>,
}

impl Combo {
    /// Build a combo on `underlying` from qualified legs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCombo` when there are no legs, a ratio is zero, or a leg
    /// belongs to a different symbol.
    pub fn new(underlying: &QualifiedContract, legs: Vec<StrategyLeg>) -> Result<Self> {
        if legs.is_empty() {
            return Err(IbError::InvalidCombo("combo needs at least one leg".into()));
        }
        for leg in &legs {
            if leg.ratio == 0 {
                return Err(IbError::InvalidCombo(format!(
                    "leg {} has a zero ratio",
                    leg.contract.display_name()
                )));
            }
            if leg.contract.symbol() != underlying.symbol() {
                return Err(IbError::InvalidCombo(format!(
                    "leg {} does not belong to underlying {}",
                    leg.contract.display_name(),
                    underlying.symbol()
                )));
            }
        }

        Ok(Self {
            symbol: underlying.spec.symbol.clone(),
            currency: underlying.spec.currency.clone(),
            exchange: underlying.spec.exchange.clone(),
            legs,
        })
    }

    pub fn display_name(&self) -> String {
        let legs: Vec<String> = self
            .legs
            .iter()
            .map(|leg| {
                let strike = leg
                    .contract
                    .strike()
                    .map(|s| s.normalize().to_string())
                    .unwrap_or_default();
                let right = leg.contract.spec.right.map(|r| r.to_string()).unwrap_or_default();
                format!("{} {}x{}{}", leg.action, leg.ratio, strike, right)
            })
            .collect();
        format!("{} BAG [{}]", self.symbol, legs.join(", "))
    }
}

/// Snapshot of a contract's prices; every field already sanitized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub last: Option<Decimal>,
    /// Prior session close as reported on the quote line.
    pub close: Option<Decimal>,
    /// Theoretical price from IB's option model.
    pub model: Option<Decimal>,
}

impl PriceQuote {
    /// Quote with both sides and no other fields, mainly for fixtures.
    pub fn bid_ask(bid: Decimal, ask: Decimal) -> Self {
        Self {
            bid: Some(bid),
            ask: Some(ask),
            ..Self::default()
        }
    }

    /// Bid/ask midpoint when both sides are quoted.
    #[must_use]
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bid.is_none()
            && self.ask.is_none()
            && self.last.is_none()
            && self.close.is_none()
            && self.model.is_none()
    }
}

/// A historical price bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Option chain parameters for one exchange/trading class of an underlying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChainParams {
    pub exchange: String,
    pub trading_class: String,
    pub multiplier: String,
    pub underlying_con_id: i32,
    /// Expirations as `YYYYMMDD`.
    pub expirations: Vec<String>,
    pub strikes: Vec<Decimal>,
}

impl OptionChainParams {
    #[must_use]
    pub fn has_expiry(&self, expiry: &str) -> bool {
        self.expirations.iter().any(|e| e == expiry)
    }
}

/// IB Adaptive algo urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdaptivePriority {
    Urgent,
    #[default]
    Normal,
    Patient,
}

impl fmt::Display for AdaptivePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Urgent => write!(f, "Urgent"),
            Self::Normal => write!(f, "Normal"),
            Self::Patient => write!(f, "Patient"),
        }
    }
}

impl FromStr for AdaptivePriority {
    type Err = IbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "normal" => Ok(Self::Normal),
            "patient" => Ok(Self::Patient),
            other => Err(IbError::Api(format!("unknown adaptive priority '{other}'"))),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit { price: Decimal },
    /// Trailing stop, trail expressed as percent of price.
    TrailingStop { trailing_percent: Decimal },
}

impl OrderKind {
    /// IB order type code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Limit { .. } => "LMT",
            Self::TrailingStop { .. } => "TRAIL",
        }
    }
}

/// An order to place via IB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub action: Action,
    pub quantity: u32,
    pub kind: OrderKind,
    /// When false the order is staged in TWS but not sent to the exchange.
    pub transmit: bool,
    /// Free-form tag IB stores as `orderRef`.
    pub order_ref: String,
    /// Route through IB's Adaptive algo with this priority.
    pub adaptive: Option<AdaptivePriority>,
    /// Parent order id for bracket children.
    pub parent_id: Option<i32>,
}

impl OrderTicket {
    pub fn limit(action: Action, quantity: u32, price: Decimal) -> Self {
        Self {
            action,
            quantity,
            kind: OrderKind::Limit { price },
            transmit: false,
            order_ref: String::new(),
            adaptive: None,
            parent_id: None,
        }
    }

    pub fn trailing_stop(action: Action, quantity: u32, trailing_percent: Decimal) -> Self {
        Self {
            kind: OrderKind::TrailingStop { trailing_percent },
            ..Self::limit(action, quantity, Decimal::ZERO)
        }
    }

    #[must_use]
    pub fn transmit(mut self, transmit: bool) -> Self {
        self.transmit = transmit;
        self
    }

    #[must_use]
    pub fn order_ref(mut self, tag: &str) -> Self {
        self.order_ref = tag.to_string();
        self
    }

    #[must_use]
    pub fn adaptive(mut self, priority: AdaptivePriority) -> Self {
        self.adaptive = Some(priority);
        self
    }

    #[must_use]
    pub fn child_of(mut self, parent_id: i32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn limit_price(&self) -> Option<Decimal> {
        match self.kind {
            OrderKind::Limit { price } => Some(price),
            OrderKind::TrailingStop { .. } => None,
        }
    }
}

/// What an order trades: a single contract or a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTarget {
    Contract(QualifiedContract),
    Combo(Combo),
}

impl OrderTarget {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Contract(contract) => contract.symbol(),
            Self::Combo(combo) => &combo.symbol,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Contract(contract) => contract.display_name(),
            Self::Combo(combo) => combo.display_name(),
        }
    }
}

/// Order status as reported by TWS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    PendingSubmit,
    PendingCancel,
    PreSubmitted,
    Submitted,
    ApiCancelled,
    Cancelled,
    Filled,
    Inactive,
    Unknown(String),
}

impl OrderStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "PendingSubmit" => Self::PendingSubmit,
            "PendingCancel" => Self::PendingCancel,
            "PreSubmitted" => Self::PreSubmitted,
            "Submitted" => Self::Submitted,
            "ApiCancelled" => Self::ApiCancelled,
            "Cancelled" => Self::Cancelled,
            "Filled" => Self::Filled,
            "Inactive" => Self::Inactive,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the broker took the order (working or done).
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::PendingSubmit | Self::PreSubmitted | Self::Filled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(status) => write!(f, "{status}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Broker acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: i32,
    pub status: OrderStatus,
    pub filled: Decimal,
    pub avg_fill_price: Option<Decimal>,
}

/// Acknowledgements for a parent order and its attached child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketAck {
    pub parent: OrderAck,
    pub child: OrderAck,
}

/// A working order in the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: i32,
    pub symbol: String,
    pub action: Action,
    pub order_type: String,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub status: OrderStatus,
    pub order_ref: String,
}

/// A fill reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: i32,
    pub execution_id: String,
    pub symbol: String,
    pub local_symbol: String,
    pub side: Action,
    pub shares: Decimal,
    pub avg_price: Decimal,
    pub time: DateTime<Utc>,
}

/// An account position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub account: String,
    pub contract: QualifiedContract,
    /// Signed quantity, negative when short.
    pub position: Decimal,
    pub avg_cost: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sentinel_and_nan_are_not_prices() {
        assert_eq!(usable_price(f64::NAN), None);
        assert_eq!(usable_price(f64::INFINITY), None);
        assert_eq!(usable_price(NO_DATA_SENTINEL), None);
        assert_eq!(usable_price(0.0), Some(Decimal::ZERO));
        assert_eq!(usable_price(5801.25), Some(dec!(5801.25)));
    }

    #[test]
    fn derivative_of_future_is_future_option() {
        assert_eq!(SecType::Future.derivative(), SecType::FutureOption);
        assert_eq!(SecType::Index.derivative(), SecType::Option);
        assert_eq!("fop".parse::<SecType>().unwrap(), SecType::FutureOption);
        assert!("XYZ".parse::<SecType>().is_err());
    }

    #[test]
    fn validation_mirrors_required_fields() {
        assert!(ContractSpec::index("SPX", "CBOE").validate().is_ok());

        let fut = ContractSpec::future("ES", "CME", "", "50");
        assert!(matches!(fut.validate(), Err(IbError::InvalidContract(_))));

        let mut opt = ContractSpec::option("SPX", "20241108", dec!(5800), OptionRight::Put);
        assert!(opt.validate().is_ok());
        opt.right = None;
        assert!(opt.validate().is_err());
    }

    #[test]
    fn option_on_future_inherits_routing() {
        let es = ContractSpec::future("ES", "CME", "202412", "50");
        let put = ContractSpec::option_on(&es, "20241108", dec!(5800), OptionRight::Put);
        assert_eq!(put.sec_type, SecType::FutureOption);
        assert_eq!(put.exchange, "CME");
        assert_eq!(put.multiplier, "50");
        assert_eq!(put.display_name(), "ES FOP 20241108 5800P @CME");
    }

    #[test]
    fn combo_rejects_foreign_legs() {
        let spx = QualifiedContract::new(416904, ContractSpec::index("SPX", "CBOE"));
        let ndx_put = QualifiedContract::new(
            9,
            ContractSpec::option("NDX", "20241108", dec!(20000), OptionRight::Put),
        );
        let err = Combo::new(&spx, vec![StrategyLeg::new(ndx_put, Action::Sell, 1)]);
        assert!(matches!(err, Err(IbError::InvalidCombo(_))));
        assert!(Combo::new(&spx, vec![]).is_err());
    }

    #[test]
    fn midpoint_needs_both_sides() {
        let quote = PriceQuote::bid_ask(dec!(1.10), dec!(1.30));
        assert_eq!(quote.midpoint(), Some(dec!(1.20)));
        let one_sided = PriceQuote {
            bid: Some(dec!(1.10)),
            ..PriceQuote::default()
        };
        assert_eq!(one_sided.midpoint(), None);
    }

    #[test]
    fn accepted_statuses() {
        assert!(OrderStatus::parse("PreSubmitted").is_accepted());
        assert!(OrderStatus::parse("Filled").is_accepted());
        assert!(!OrderStatus::parse("Cancelled").is_accepted());
        assert_eq!(OrderStatus::parse("Weird"), OrderStatus::Unknown("Weird".into()));
    }
}
