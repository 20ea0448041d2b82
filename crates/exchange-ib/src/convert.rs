//! Conversions between our contract/order types and `ibapi` structures.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ibapi::contracts::{ComboLeg, Contract, SecurityType};
use ibapi::orders::{Order, TagValue};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{IbError, Result};
use crate::types::{
    usable_price, Action, Combo, ContractSpec, OptionRight, OrderKind, OrderTarget, OrderTicket,
    QualifiedContract, SecType,
};

fn to_security_type(sec_type: SecType) -> SecurityType {
    match sec_type {
        SecType::Stock => SecurityType::Stock,
        SecType::Future => SecurityType::Future,
        SecType::Option => SecurityType::Option,
        SecType::FutureOption => SecurityType::FuturesOption,
        SecType::Index => SecurityType::Index,
        SecType::Combo => SecurityType::Spread,
    }
}

fn from_security_type(security_type: &SecurityType) -> Result<SecType> {
    security_type.to_string().parse()
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Descriptor (or qualified contract with `con_id`) as an ibapi contract.
pub(crate) fn to_ib_contract(spec: &ContractSpec, con_id: i32) -> Contract {
    Contract {
        contract_id: con_id,
        symbol: spec.symbol.as_str().into(),
        security_type: to_security_type(spec.sec_type),
        last_trade_date_or_contract_month: spec.expiry.clone(),
        strike: spec.strike.map(to_f64).unwrap_or_default(),
        right: spec.right.map(|r| r.to_string()).unwrap_or_default(),
        multiplier: spec.multiplier.clone(),
        exchange: spec.exchange.as_str().into(),
        currency: spec.currency.as_str().into(),
        ..Default::default()
    }
}

pub(crate) fn qualified_to_ib(contract: &QualifiedContract) -> Contract {
    to_ib_contract(&contract.spec, contract.con_id)
}

/// Combo as an IB BAG contract; every leg opens with the parent (`open_close` default).
pub(crate) fn combo_to_ib(combo: &Combo) -> Contract {
    let combo_legs = combo
        .legs
        .iter()
        .map(|leg| ComboLeg {
            contract_id: leg.contract.con_id,
            ratio: i32::try_from(leg.ratio).unwrap_or(i32::MAX),
            action: leg.action.to_string(),
            exchange: leg.contract.spec.exchange.clone(),
            ..Default::default()
        })
        .collect();

    Contract {
        symbol: combo.symbol.as_str().into(),
        security_type: SecurityType::Spread,
        exchange: combo.exchange.as_str().into(),
        currency: combo.currency.as_str().into(),
        combo_legs,
        ..Default::default()
    }
}

pub(crate) fn target_to_ib(target: &OrderTarget) -> Contract {
    match target {
        OrderTarget::Contract(contract) => qualified_to_ib(contract),
        OrderTarget::Combo(combo) => combo_to_ib(combo),
    }
}

/// ibapi contract back into a qualified contract.
pub(crate) fn from_ib_contract(contract: &Contract) -> Result<QualifiedContract> {
    let right = match contract.right.as_str() {
        "" | "0" | "?" => None,
        other => Some(other.parse::<OptionRight>()?),
    };
    let strike = if contract.strike > 0.0 {
        usable_price(contract.strike)
    } else {
        None
    };

    let spec = ContractSpec {
        symbol: contract.symbol.to_string(),
        sec_type: from_security_type(&contract.security_type)?,
        expiry: contract.last_trade_date_or_contract_month.clone(),
        strike,
        right,
        exchange: contract.exchange.to_string(),
        currency: contract.currency.to_string(),
        multiplier: contract.multiplier.clone(),
    };

    Ok(QualifiedContract {
        con_id: contract.contract_id,
        spec,
        local_symbol: contract.local_symbol.clone(),
        trading_class: contract.trading_class.clone(),
    })
}

pub(crate) fn to_ib_action(action: Action) -> ibapi::orders::Action {
    match action {
        Action::Buy => ibapi::orders::Action::Buy,
        Action::Sell => ibapi::orders::Action::Sell,
    }
}

pub(crate) fn from_ib_action(action: &ibapi::orders::Action) -> Action {
    match action {
        ibapi::orders::Action::Buy => Action::Buy,
        _ => Action::Sell,
    }
}

/// Ticket as an ibapi order.
pub(crate) fn to_ib_order(ticket: &OrderTicket) -> Order {
    let mut order = Order {
        action: to_ib_action(ticket.action),
        total_quantity: f64::from(ticket.quantity),
        order_type: ticket.kind.code().to_string(),
        transmit: ticket.transmit,
        order_ref: ticket.order_ref.clone(),
        parent_id: ticket.parent_id.unwrap_or_default(),
        ..Default::default()
    };

    match ticket.kind {
        OrderKind::Limit { price } => order.limit_price = Some(to_f64(price)),
        OrderKind::TrailingStop { trailing_percent } => {
            order.trailing_percent = Some(to_f64(trailing_percent));
        }
    }

    if let Some(priority) = ticket.adaptive {
        order.algo_strategy = "Adaptive".to_string();
        order.algo_params = vec![TagValue {
            tag: "adaptivePriority".to_string(),
            value: priority.to_string(),
        }];
    }

    order
}

/// Account and order quantities. Unlike quote ticks, `-1` is a real value here
/// (a one-lot short, a 1.00 credit fill).
pub(crate) fn to_decimal(raw: f64) -> Result<Decimal> {
    if !raw.is_finite() {
        return Err(IbError::Api(format!("non-finite number {raw}")));
    }
    Decimal::from_f64(raw)
        .map(|d| d.normalize())
        .ok_or_else(|| IbError::Api(format!("unrepresentable number {raw}")))
}

/// Limit price of a working order; unset or unrepresentable limits read as `None`.
pub(crate) fn order_limit(raw: Option<f64>) -> Option<Decimal> {
    raw.and_then(|limit| to_decimal(limit).ok())
}

/// Parse an execution timestamp such as `20241108  10:31:05 US/Eastern`.
///
/// The wall clock is read in the suffixed IANA zone. Without a recognizable
/// zone it falls back to the host's local timezone.
pub(crate) fn parse_execution_time(raw: &str) -> Option<DateTime<Utc>> {
    let mut parts = raw.split_whitespace();
    let date = parts.next()?;
    let time = parts.next()?;
    let naive = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y%m%d %H:%M:%S").ok()?;

    match parts.next().map(str::parse::<Tz>) {
        Some(Ok(zone)) => zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|exchange| exchange.with_timezone(&Utc)),
        _ => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AdaptivePriority;
    use chrono::Timelike;
    use rust_decimal_macros::dec;

    #[test]
    fn execution_time_reads_exchange_zone() {
        let parsed = parse_execution_time("20241108  10:31:05 US/Eastern").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 11, 8, 15, 31, 5).unwrap());

        let summer = parse_execution_time("20240708 23:30:00 US/Eastern").unwrap();
        assert_eq!(summer, Utc.with_ymd_and_hms(2024, 7, 9, 3, 30, 0).unwrap());
    }

    #[test]
    fn execution_time_without_zone_is_local() {
        let parsed = parse_execution_time("20241108 10:31:05").unwrap();
        let local = parsed.with_timezone(&Local);
        assert_eq!(local.format("%Y%m%d").to_string(), "20241108");
        assert_eq!(local.hour(), 10);
        assert!(parse_execution_time("garbage").is_none());
    }

    #[test]
    fn minus_one_is_a_real_quantity() {
        assert_eq!(to_decimal(-1.0).unwrap(), dec!(-1));
        assert_eq!(to_decimal(-2.5).unwrap(), dec!(-2.5));
        assert!(to_decimal(f64::NAN).is_err());
        assert!(to_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn credit_limit_of_one_survives() {
        assert_eq!(order_limit(Some(-1.0)), Some(dec!(-1)));
        assert_eq!(order_limit(Some(3.4)), Some(dec!(3.4)));
        assert_eq!(order_limit(None), None);
        assert_eq!(order_limit(Some(f64::MAX)), None);
    }

    #[test]
    fn adaptive_limit_order_fields() {
        let ticket = OrderTicket::limit(Action::Buy, 2, dec!(-3.40))
            .order_ref("condor")
            .adaptive(AdaptivePriority::Patient);
        let order = to_ib_order(&ticket);
        assert_eq!(order.order_type, "LMT");
        assert_eq!(order.limit_price, Some(-3.4));
        assert_eq!(order.total_quantity, 2.0);
        assert_eq!(order.algo_strategy, "Adaptive");
        assert_eq!(order.algo_params[0].value, "Patient");
        assert!(!order.transmit);
    }

    #[test]
    fn trailing_child_links_parent() {
        let ticket = OrderTicket::trailing_stop(Action::Sell, 1, dec!(15))
            .child_of(1001)
            .transmit(true);
        let order = to_ib_order(&ticket);
        assert_eq!(order.order_type, "TRAIL");
        assert_eq!(order.parent_id, 1001);
        assert_eq!(order.trailing_percent, Some(15.0));
        assert!(order.transmit);
    }
}
