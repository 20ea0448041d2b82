//! Credit spreads reconstructed from account positions.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_trader_ib::{OptionRight, OrderRouter, PositionRecord};
use tracing::info;

/// A short option paired with its protective long option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSpread {
    pub right: OptionRight,
    pub short_strike: Decimal,
    pub long_strike: Decimal,
    pub short: PositionRecord,
    pub long: PositionRecord,
}

impl CreditSpread {
    #[must_use]
    pub fn width(&self) -> Decimal {
        (self.long_strike - self.short_strike).abs()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadScan {
    pub call_credit: Vec<CreditSpread>,
    pub put_credit: Vec<CreditSpread>,
}

fn option_positions(
    positions: &[PositionRecord],
    symbol: &str,
    expiry: &str,
    right: OptionRight,
) -> (Vec<(Decimal, PositionRecord)>, Vec<(Decimal, PositionRecord)>) {
    let mut shorts = Vec::new();
    let mut longs = Vec::new();

    for position in positions {
        let spec = &position.contract.spec;
        if !spec.sec_type.is_option()
            || !spec.symbol.eq_ignore_ascii_case(symbol)
            || spec.expiry != expiry
            || spec.right != Some(right)
        {
            continue;
        }
        let Some(strike) = spec.strike else {
            continue;
        };
        if position.position < Decimal::ZERO {
            shorts.push((strike, position.clone()));
        } else if position.position > Decimal::ZERO {
            longs.push((strike, position.clone()));
        }
    }

    (shorts, longs)
}

/// Pair each short with the nearest unused long on its protective side.
fn pair(
    right: OptionRight,
    mut shorts: Vec<(Decimal, PositionRecord)>,
    mut longs: Vec<(Decimal, PositionRecord)>,
) -> Vec<CreditSpread> {
    shorts.sort_by_key(|(strike, _)| *strike);
    // Calls protect upward, puts downward; nearest protective strike first.
    match right {
        OptionRight::Call => longs.sort_by_key(|(strike, _)| *strike),
        OptionRight::Put => longs.sort_by(|a, b| b.0.cmp(&a.0)),
    }

    let mut used = vec![false; longs.len()];
    let mut spreads = Vec::new();

    for (short_strike, short) in shorts {
        let eligible = longs.iter().enumerate().find(|(i, (long_strike, _))| {
            !used[*i]
                && match right {
                    OptionRight::Call => *long_strike > short_strike,
                    OptionRight::Put => *long_strike < short_strike,
                }
        });
        if let Some((i, (long_strike, long))) = eligible {
            used[i] = true;
            spreads.push(CreditSpread {
                right,
                short_strike,
                long_strike: *long_strike,
                short,
                long: long.clone(),
            });
        }
    }

    spreads
}

/// Credit spreads among `positions` for `symbol` expiring on `expiry`.
#[must_use]
pub fn scan_spreads(positions: &[PositionRecord], symbol: &str, expiry: &str) -> SpreadScan {
    let (short_calls, long_calls) = option_positions(positions, symbol, expiry, OptionRight::Call);
    let (short_puts, long_puts) = option_positions(positions, symbol, expiry, OptionRight::Put);

    SpreadScan {
        call_credit: pair(OptionRight::Call, short_calls, long_calls),
        put_credit: pair(OptionRight::Put, short_puts, long_puts),
    }
}

pub async fn position_spreads<B>(broker: &B, symbol: &str, expiry: &str) -> Result<SpreadScan>
where
    B: OrderRouter + ?Sized,
{
    let positions = broker.positions().await.context("Failed to fetch positions")?;
    let scan = scan_spreads(&positions, symbol, expiry);
    info!(
        symbol,
        expiry,
        call_credit = scan.call_credit.len(),
        put_credit = scan.put_credit.len(),
        "Position spread scan"
    );
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spread_trader_ib::{ContractSpec, QualifiedContract};

    fn position(strike: Decimal, right: OptionRight, qty: Decimal) -> PositionRecord {
        let spec = ContractSpec::option("SPX", "20241108", strike, right);
        PositionRecord {
            account: "DU123".into(),
            contract: QualifiedContract::new(1, spec),
            position: qty,
            avg_cost: dec!(100),
        }
    }

    #[test]
    fn long_leg_is_used_once() {
        let positions = vec![
            position(dec!(5900), OptionRight::Call, dec!(-1)),
            position(dec!(5910), OptionRight::Call, dec!(-1)),
            position(dec!(5950), OptionRight::Call, dec!(1)),
        ];
        let scan = scan_spreads(&positions, "SPX", "20241108");
        assert_eq!(scan.call_credit.len(), 1);
        assert_eq!(scan.call_credit[0].short_strike, dec!(5900));
        assert_eq!(scan.call_credit[0].width(), dec!(50));
    }

    #[test]
    fn put_spreads_need_strictly_lower_long() {
        let positions = vec![
            position(dec!(5700), OptionRight::Put, dec!(-1)),
            position(dec!(5700), OptionRight::Put, dec!(1)),
            position(dec!(5625), OptionRight::Put, dec!(1)),
            position(dec!(5600), OptionRight::Put, dec!(1)),
        ];
        let scan = scan_spreads(&positions, "SPX", "20241108");
        assert_eq!(scan.put_credit.len(), 1);
        assert_eq!(scan.put_credit[0].long_strike, dec!(5625));
        assert!(scan.call_credit.is_empty());
    }

    #[test]
    fn other_expiries_and_symbols_are_ignored() {
        let mut other = position(dec!(5950), OptionRight::Call, dec!(1));
        other.contract.spec.expiry = "20241115".into();
        let positions = vec![position(dec!(5900), OptionRight::Call, dec!(-1)), other];
        assert!(scan_spreads(&positions, "SPX", "20241108").call_credit.is_empty());
        assert!(scan_spreads(&positions, "NDX", "20241108").call_credit.is_empty());
    }

    #[test]
    fn expiry_must_match_exactly() {
        let positions = vec![
            position(dec!(5900), OptionRight::Call, dec!(-1)),
            position(dec!(5950), OptionRight::Call, dec!(1)),
        ];
        assert!(scan_spreads(&positions, "SPX", "").call_credit.is_empty());
        assert!(scan_spreads(&positions, "SPX", "202411").call_credit.is_empty());
        assert_eq!(scan_spreads(&positions, "SPX", "20241108").call_credit.len(), 1);
    }
}
