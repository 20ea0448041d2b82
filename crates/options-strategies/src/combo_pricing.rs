//! Combo price aggregation from leg quotes or model prices.
//!
//! Sold legs contribute positively and bought legs negatively, scaled by
//! ratio, so a positive aggregate is a net credit.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_trader_core::{PricingConfig, RoundingMode};
use spread_trader_ib::{Action, Combo, MarketData, PriceQuote, StrategyLeg};
use tracing::{debug, warn};

use crate::discovery::latest_close;
use crate::tick::round_to_tick;
use crate::types::PriceSource;

/// Describe a leg for logs and reports, e.g. `SELL 1x SPX 5800P`.
pub fn leg_label(leg: &StrategyLeg) -> String {
    let spec = &leg.contract.spec;
    let strike = spec.strike.map(|s| s.normalize().to_string()).unwrap_or_default();
    let right = spec.right.map(|r| r.to_string()).unwrap_or_default();
    format!("{} {}x {} {}{}", leg.action, leg.ratio, spec.symbol, strike, right)
}

/// Aggregated bid/ask midpoint of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboMid {
    pub bid: Decimal,
    pub ask: Decimal,
    pub mid: Decimal,
    /// `mid` on the tick grid.
    pub rounded: Decimal,
    /// Legs missing a bid or ask; the missing side counted as zero.
    pub missing_legs: Vec<String>,
}

impl ComboMid {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_legs.is_empty()
    }
}

/// Signed sum of leg quotes. `None` quotes count as zero and are reported.
pub fn aggregate_mid(
    legs: &[(StrategyLeg, Option<PriceQuote>)],
    tick: Decimal,
    mode: RoundingMode,
) -> ComboMid {
    let mut bid = Decimal::ZERO;
    let mut ask = Decimal::ZERO;
    let mut missing_legs = Vec::new();

    for (leg, quote) in legs {
        let weight = leg.weight();
        let (leg_bid, leg_ask) = quote
            .as_ref()
            .map_or((None, None), |q| (q.bid, q.ask));

        if leg_bid.is_none() || leg_ask.is_none() {
            let label = leg_label(leg);
            warn!(leg = %label, bid = ?leg_bid, ask = ?leg_ask, "Leg quote incomplete, counting missing side as zero");
            missing_legs.push(label);
        }

        bid += weight * leg_bid.unwrap_or_default();
        ask += weight * leg_ask.unwrap_or_default();
    }

    let mid = (bid + ask) / Decimal::TWO;
    ComboMid {
        bid,
        ask,
        mid,
        rounded: round_to_tick(mid, tick, mode),
        missing_legs,
    }
}

/// Quote every leg and aggregate the midpoints.
pub async fn combo_mid<B>(broker: &B, combo: &Combo, tick: Decimal, mode: RoundingMode) -> ComboMid
where
    B: MarketData + ?Sized,
{
    let mut quoted = Vec::with_capacity(combo.legs.len());
    for leg in &combo.legs {
        let quote = match broker.quote(&leg.contract).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(leg = %leg_label(leg), error = %e, "Leg quote failed");
                None
            }
        };
        quoted.push((leg.clone(), quote));
    }

    let result = aggregate_mid(&quoted, tick, mode);
    debug!(
        combo = %combo.display_name(),
        bid = %result.bid,
        ask = %result.ask,
        mid = %result.rounded,
        "Combo mid aggregated"
    );
    result
}

/// Price of one leg and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegPrice {
    pub leg: String,
    pub action: Action,
    pub ratio: u32,
    pub price: Decimal,
    pub source: PriceSource,
}

/// Aggregated theoretical price of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboPrice {
    pub legs: Vec<LegPrice>,
    /// Legs no source could price; they are left out of `total`.
    pub skipped_legs: Vec<String>,
    pub total: Decimal,
    pub rounded: Decimal,
}

impl ComboPrice {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped_legs.is_empty()
    }
}

/// Model price, else quote midpoint, else latest daily close.
async fn price_leg<B>(broker: &B, leg: &StrategyLeg, pricing: &PricingConfig) -> Option<(Decimal, PriceSource)>
where
    B: MarketData + ?Sized,
{
    let label = leg_label(leg);
    let wait = Duration::from_millis(pricing.model_wait_ms);

    match broker.model_price(&leg.contract, wait).await {
        Ok(Some(price)) => return Some((price, PriceSource::Model)),
        Ok(None) => debug!(leg = %label, "No model price"),
        Err(e) => warn!(leg = %label, error = %e, "Model price request failed"),
    }

    match broker.quote(&leg.contract).await {
        Ok(quote) => {
            if let Some(mid) = quote.midpoint() {
                return Some((mid, PriceSource::Midpoint));
            }
        }
        Err(e) => warn!(leg = %label, error = %e, "Leg quote failed"),
    }

    latest_close(broker, &leg.contract, pricing.history_days)
        .await
        .map(|close| (close, PriceSource::HistoricalClose))
}

/// Price each leg from the best available source and aggregate.
pub async fn model_combo_price<B>(broker: &B, combo: &Combo, pricing: &PricingConfig) -> ComboPrice
where
    B: MarketData + ?Sized,
{
    let mut legs = Vec::with_capacity(combo.legs.len());
    let mut skipped_legs = Vec::new();
    let mut total = Decimal::ZERO;

    for leg in &combo.legs {
        match price_leg(broker, leg, pricing).await {
            Some((price, source)) => {
                total += leg.weight() * price;
                legs.push(LegPrice {
                    leg: leg_label(leg),
                    action: leg.action,
                    ratio: leg.ratio,
                    price,
                    source,
                });
            }
            None => {
                let label = leg_label(leg);
                warn!(leg = %label, "No price source for leg, skipping");
                skipped_legs.push(label);
            }
        }
    }

    let tick = pricing.tick_size_for(&combo.symbol);
    let rounded = round_to_tick(total, tick, pricing.rounding);
    debug!(combo = %combo.display_name(), %total, %rounded, skipped = skipped_legs.len(), "Combo model price aggregated");

    ComboPrice {
        legs,
        skipped_legs,
        total,
        rounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spread_trader_ib::{ContractSpec, OptionRight, QualifiedContract};

    fn leg(con_id: i32, strike: Decimal, action: Action) -> StrategyLeg {
        let spec = ContractSpec::option("SPX", "20241108", strike, OptionRight::Put);
        StrategyLeg::new(QualifiedContract::new(con_id, spec), action, 1)
    }

    fn quote(bid: Decimal, ask: Decimal) -> Option<PriceQuote> {
        Some(PriceQuote::bid_ask(bid, ask))
    }

    #[test]
    fn sold_minus_bought() {
        let legs = vec![
            (leg(1, dec!(5725), Action::Buy), quote(dec!(1.0), dec!(1.2))),
            (leg(2, dec!(5800), Action::Sell), quote(dec!(2.0), dec!(2.4))),
        ];
        let result = aggregate_mid(&legs, dec!(0.05), RoundingMode::HalfEven);
        assert_eq!(result.bid, dec!(1.0));
        assert_eq!(result.ask, dec!(1.2));
        assert_eq!(result.mid, dec!(1.1));
        assert_eq!(result.rounded, dec!(1.1));
        assert!(result.is_complete());
    }

    #[test]
    fn missing_quote_counts_as_zero_and_is_reported() {
        let legs = vec![
            (leg(1, dec!(5725), Action::Buy), None),
            (leg(2, dec!(5800), Action::Sell), quote(dec!(2.0), dec!(2.2))),
        ];
        let result = aggregate_mid(&legs, dec!(0.10), RoundingMode::HalfEven);
        assert_eq!(result.mid, dec!(2.1));
        assert_eq!(result.missing_legs, vec!["BUY 1x SPX 5725P".to_string()]);
    }

    #[test]
    fn ratio_scales_contribution() {
        let mut sold = leg(2, dec!(5800), Action::Sell);
        sold.ratio = 2;
        let legs = vec![(sold, quote(dec!(1.0), dec!(1.0)))];
        let result = aggregate_mid(&legs, dec!(0.05), RoundingMode::HalfEven);
        assert_eq!(result.rounded, dec!(2.0));
    }
}
