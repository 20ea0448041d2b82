//! Underlying resolution: indices, stocks and front-month futures.

use anyhow::{bail, Context, Result};
use chrono::Local;
use spread_trader_ib::{ContractResolver, ContractSpec, QualifiedContract, SecType};
use tracing::{debug, info};

use crate::types::UnderlyingRequest;

/// Today's local date as an option expiry (`YYYYMMDD`).
pub fn today_expiry() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// Listed futures for a root symbol, earliest last-trade date first.
async fn listed_futures<B>(
    broker: &B,
    symbol: &str,
    exchange: &str,
    multiplier: &str,
    currency: &str,
) -> Result<Vec<QualifiedContract>>
where
    B: ContractResolver + ?Sized,
{
    let query = ContractSpec::future(symbol, exchange, "", multiplier).with_currency(currency);
    let mut futures = broker
        .contract_details(&query)
        .await
        .with_context(|| format!("Failed to list futures for {symbol} on {exchange}"))?;

    if futures.is_empty() {
        bail!("No futures listed for {symbol} on {exchange}");
    }
    futures.sort_by(|a, b| a.spec.expiry.cmp(&b.spec.expiry));
    debug!(symbol, count = futures.len(), "Listed futures");
    Ok(futures)
}

/// The future with the earliest last-trade date.
pub async fn front_month_future<B>(
    broker: &B,
    symbol: &str,
    exchange: &str,
    multiplier: &str,
    currency: &str,
) -> Result<QualifiedContract>
where
    B: ContractResolver + ?Sized,
{
    let futures = listed_futures(broker, symbol, exchange, multiplier, currency).await?;
    let front = futures
        .into_iter()
        .next()
        .with_context(|| format!("No futures listed for {symbol}"))?;
    info!(contract = %front.display_name(), "Front-month future");
    Ok(front)
}

/// The earliest future whose option chain lists `expiry`.
pub async fn front_month_with_expiry<B>(
    broker: &B,
    symbol: &str,
    exchange: &str,
    multiplier: &str,
    currency: &str,
    expiry: &str,
) -> Result<QualifiedContract>
where
    B: ContractResolver + ?Sized,
{
    for future in listed_futures(broker, symbol, exchange, multiplier, currency).await? {
        let chains = broker
            .option_chain(&future, exchange)
            .await
            .with_context(|| format!("Failed to fetch option chain for {}", future.display_name()))?;

        if chains.iter().any(|chain| chain.has_expiry(expiry)) {
            info!(contract = %future.display_name(), expiry, "Front-month future with expiry");
            return Ok(future);
        }
        debug!(contract = %future.display_name(), expiry, "Expiry not in chain");
    }

    bail!("No {symbol} future on {exchange} has options expiring {expiry}")
}

/// Qualify the underlying a strategy is written on.
pub async fn resolve_underlying<B>(
    broker: &B,
    request: &UnderlyingRequest,
    expiry: &str,
) -> Result<QualifiedContract>
where
    B: ContractResolver + ?Sized,
{
    match request.sec_type {
        SecType::Future => {
            front_month_with_expiry(
                broker,
                &request.symbol,
                &request.exchange,
                &request.multiplier,
                &request.currency,
                expiry,
            )
            .await
        }
        SecType::Stock | SecType::Index => {
            let spec = ContractSpec::from_parts(
                &request.symbol,
                request.sec_type,
                &request.exchange,
                &request.currency,
            );
            broker
                .qualify(&spec)
                .await
                .with_context(|| format!("Failed to qualify underlying {}", spec.display_name()))
        }
        other => bail!("{other} cannot be used as a strategy underlying"),
    }
}
