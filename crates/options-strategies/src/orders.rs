//! Order submission and order/fill queries.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use spread_trader_ib::{
    Action, AdaptivePriority, BracketAck, ExecutionReport, OpenOrder, OrderAck, OrderRouter,
    OrderTarget, OrderTicket,
};
use tracing::{info, warn};

/// Limit for a BUY of a combo priced at `aggregate`.
///
/// IB quotes a combo BUY as the net debit, so a credit (positive aggregate)
/// becomes a negative limit.
#[must_use]
pub fn combo_limit_price(aggregate: Decimal) -> Decimal {
    -aggregate
}

/// A single limit order.
#[derive(Debug, Clone)]
pub struct LimitOrder {
    pub action: Action,
    pub quantity: u32,
    pub limit_price: Decimal,
    /// Transmit to the exchange; otherwise staged in TWS.
    pub live: bool,
    pub tag: String,
}

/// Submit a limit order and require the broker to accept it.
pub async fn submit_limit<B>(broker: &B, target: &OrderTarget, order: &LimitOrder) -> Result<OrderAck>
where
    B: OrderRouter + ?Sized,
{
    let ticket = OrderTicket::limit(order.action, order.quantity, order.limit_price)
        .transmit(order.live)
        .order_ref(&order.tag);

    let ack = broker
        .place_order(target, &ticket)
        .await
        .with_context(|| format!("Failed to place order for {}", target.display_name()))?;

    if !ack.status.is_accepted() {
        bail!("Order {} for {} was not accepted: {}", ack.order_id, target.display_name(), ack.status);
    }

    info!(
        order_id = ack.order_id,
        target = %target.display_name(),
        action = %order.action,
        limit = %order.limit_price,
        live = order.live,
        status = %ack.status,
        "Limit order accepted"
    );
    Ok(ack)
}

/// Adaptive limit entry protected by a trailing stop.
#[derive(Debug, Clone)]
pub struct BracketOrder {
    pub action: Action,
    pub quantity: u32,
    pub limit_price: Decimal,
    pub priority: AdaptivePriority,
    pub trailing_percent: Decimal,
    pub live: bool,
    pub tag: String,
}

/// Place an Adaptive LMT parent with a TRAIL child on the opposite side.
///
/// The parent is never transmitted on its own; the child carries the
/// `live` flag and releases both.
pub async fn submit_adaptive_bracket<B>(
    broker: &B,
    target: &OrderTarget,
    order: &BracketOrder,
) -> Result<BracketAck>
where
    B: OrderRouter + ?Sized,
{
    if order.trailing_percent <= Decimal::ZERO {
        bail!("Trailing percent must be positive, got {}", order.trailing_percent);
    }

    let parent = OrderTicket::limit(order.action, order.quantity, order.limit_price)
        .adaptive(order.priority)
        .order_ref(&order.tag);
    let child = OrderTicket::trailing_stop(order.action.opposite(), order.quantity, order.trailing_percent)
        .transmit(order.live)
        .order_ref(&order.tag);

    let ack = broker
        .place_bracket(target, &parent, &child)
        .await
        .with_context(|| format!("Failed to place bracket for {}", target.display_name()))?;

    for leg in [&ack.parent, &ack.child] {
        if !leg.status.is_accepted() {
            bail!("Bracket order {} was not accepted: {}", leg.order_id, leg.status);
        }
    }

    info!(
        parent_id = ack.parent.order_id,
        child_id = ack.child.order_id,
        target = %target.display_name(),
        priority = %order.priority,
        trailing_percent = %order.trailing_percent,
        live = order.live,
        "Adaptive bracket placed"
    );
    Ok(ack)
}

/// Day window for filled-order queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl Timeframe {
    /// Local calendar day this timeframe names, relative to `today`.
    #[must_use]
    pub fn day(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Yesterday => today.checked_sub_days(Days::new(1)).unwrap_or(today),
            Self::Date(date) => date,
        }
    }

    /// `[start, start + 1 day)` in UTC for the local day.
    pub fn window(self, today: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let day = self.day(today);
        let next = day.checked_add_days(Days::new(1)).context("date out of range")?;
        Ok((local_midnight(day)?, local_midnight(next)?))
    }

    #[must_use]
    pub fn contains(self, today: NaiveDate, time: DateTime<Utc>) -> bool {
        self.window(today)
            .map(|(start, end)| start <= time && time < end)
            .unwrap_or(false)
    }
}

fn local_midnight(day: NaiveDate) -> Result<DateTime<Utc>> {
    let naive = day.and_hms_opt(0, 0, 0).context("invalid midnight")?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .with_context(|| format!("{day} has no local midnight"))
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(Self::Date)
                .with_context(|| format!("timeframe must be today, yesterday or YYYY-MM-DD, got '{other}'")),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Yesterday => write!(f, "yesterday"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Executions inside `timeframe`, oldest first.
pub fn filter_executions(
    executions: Vec<ExecutionReport>,
    timeframe: Timeframe,
    today: NaiveDate,
) -> Vec<ExecutionReport> {
    let mut filled: Vec<ExecutionReport> = executions
        .into_iter()
        .filter(|e| timeframe.contains(today, e.time))
        .collect();
    filled.sort_by_key(|e| e.time);
    filled
}

pub async fn active_orders<B>(broker: &B) -> Result<Vec<OpenOrder>>
where
    B: OrderRouter + ?Sized,
{
    let orders = broker.open_orders().await.context("Failed to list open orders")?;
    info!(count = orders.len(), "Active orders");
    Ok(orders)
}

pub async fn filled_orders<B>(broker: &B, timeframe: Timeframe) -> Result<Vec<ExecutionReport>>
where
    B: OrderRouter + ?Sized,
{
    let executions = broker.executions().await.context("Failed to list executions")?;
    let filled = filter_executions(executions, timeframe, Local::now().date_naive());
    if filled.is_empty() {
        warn!(%timeframe, "No fills in timeframe");
    } else {
        info!(%timeframe, count = filled.len(), "Filled orders");
    }
    Ok(filled)
}
