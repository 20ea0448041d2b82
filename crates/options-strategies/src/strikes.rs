//! Closest-strike search.

use std::cmp::Ordering;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use spread_trader_ib::{
    ContractResolver, ContractSpec, MarketData, OptionRight, QualifiedContract,
};
use tracing::{debug, warn};

use crate::types::TieBreak;

/// Order two strikes by distance to `target`, equal distances by `tie`.
fn by_distance(a: Decimal, b: Decimal, target: Decimal, tie: TieBreak) -> Ordering {
    (a - target)
        .abs()
        .cmp(&(b - target).abs())
        .then_with(|| match tie {
            TieBreak::PreferHigher => b.cmp(&a),
            TieBreak::PreferLower => a.cmp(&b),
        })
}

/// Strikes in ascending distance from `target`, duplicates removed.
///
/// This is the probe order used when searching for a quoted strike.
#[must_use]
pub fn rank_by_distance(strikes: &[Decimal], target: Decimal, tie: TieBreak) -> Vec<Decimal> {
    let mut ranked = strikes.to_vec();
    ranked.sort_by(|a, b| by_distance(*a, *b, target, tie));
    ranked.dedup();
    ranked
}

/// Strike nearest to `target`; `None` when there are no strikes.
#[must_use]
pub fn closest_strike(strikes: &[Decimal], target: Decimal, tie: TieBreak) -> Option<Decimal> {
    strikes
        .iter()
        .copied()
        .min_by(|a, b| by_distance(*a, *b, target, tie))
}

/// Strike search against the broker's listed contracts for one expiry.
pub struct StrikeSelector<'a, B: ?Sized> {
    broker: &'a B,
    underlying: &'a ContractSpec,
    expiry: &'a str,
    max_quote_probes: usize,
}

impl<'a, B> StrikeSelector<'a, B>
where
    B: ContractResolver + MarketData + ?Sized,
{
    pub fn new(broker: &'a B, underlying: &'a ContractSpec, expiry: &'a str) -> Self {
        Self {
            broker,
            underlying,
            expiry,
            max_quote_probes: 8,
        }
    }

    #[must_use]
    pub fn max_quote_probes(mut self, probes: usize) -> Self {
        self.max_quote_probes = probes;
        self
    }

    /// Listed option contracts for the expiry; both rights when `right` is `None`.
    pub async fn listed(&self, right: Option<OptionRight>) -> Result<Vec<QualifiedContract>> {
        let query = ContractSpec::chain_query(self.underlying, self.expiry, right);
        let contracts = self
            .broker
            .contract_details(&query)
            .await
            .with_context(|| format!("Failed to list strikes for {}", query.display_name()))?;
        debug!(query = %query.display_name(), count = contracts.len(), "Listed option contracts");
        Ok(contracts)
    }

    /// Distinct strikes for the expiry, ascending.
    pub async fn strikes(&self, right: Option<OptionRight>) -> Result<Vec<Decimal>> {
        let mut strikes: Vec<Decimal> = self
            .listed(right)
            .await?
            .iter()
            .filter_map(QualifiedContract::strike)
            .collect();
        strikes.sort();
        strikes.dedup();
        Ok(strikes)
    }

    pub async fn closest(
        &self,
        target: Decimal,
        right: Option<OptionRight>,
        tie: TieBreak,
    ) -> Result<Option<Decimal>> {
        let strikes = self.strikes(right).await?;
        Ok(closest_strike(&strikes, target, tie))
    }

    /// Strike at the money for `underlying_price`.
    pub async fn atm(&self, underlying_price: Decimal, tie: TieBreak) -> Result<Option<Decimal>> {
        self.closest(underlying_price, None, tie).await
    }

    /// Nearest contract of `right` that currently has a usable quote.
    ///
    /// Candidates are probed nearest first and at most `max_quote_probes` are tried.
    pub async fn closest_quoted(
        &self,
        target: Decimal,
        right: OptionRight,
        tie: TieBreak,
    ) -> Result<Option<QualifiedContract>> {
        let listed = self.listed(Some(right)).await?;
        let strikes: Vec<Decimal> = listed.iter().filter_map(QualifiedContract::strike).collect();

        for strike in rank_by_distance(&strikes, target, tie)
            .into_iter()
            .take(self.max_quote_probes)
        {
            let Some(candidate) = listed.iter().find(|c| c.strike() == Some(strike)) else {
                continue;
            };
            match self.broker.quote(candidate).await {
                Ok(quote) if quote.midpoint().is_some() || quote.last.is_some() => {
                    debug!(contract = %candidate.display_name(), %target, "Closest quoted strike");
                    return Ok(Some(candidate.clone()));
                }
                Ok(_) => debug!(contract = %candidate.display_name(), "No usable quote, skipping strike"),
                Err(e) => {
                    warn!(contract = %candidate.display_name(), error = %e, "Quote failed, skipping strike");
                }
            }
        }

        Ok(None)
    }

    /// Like [`closest`](Self::closest) but skips unquoted strikes when probing is enabled.
    pub async fn pick(
        &self,
        target: Decimal,
        right: OptionRight,
        tie: TieBreak,
    ) -> Result<Option<Decimal>> {
        if self.max_quote_probes == 0 {
            return self.closest(target, Some(right), tie).await;
        }
        Ok(self
            .closest_quoted(target, right, tie)
            .await?
            .and_then(|c| c.strike()))
    }
}
