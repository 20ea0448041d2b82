//! Price discovery with bounded retry and historical fallback.

use rust_decimal::Decimal;
use spread_trader_ib::{MarketData, PriceQuote, QualifiedContract};
use tracing::{debug, info, warn};

use crate::types::{PriceDiscovery, PriceSource, RetryPolicy};

/// Best price in one quote: last trade, else bid/ask midpoint.
fn quoted_price(quote: &PriceQuote) -> Option<(Decimal, PriceSource)> {
    if let Some(last) = quote.last {
        return Some((last, PriceSource::Last));
    }
    quote.midpoint().map(|mid| (mid, PriceSource::Midpoint))
}

/// Close of the most recent daily bar.
pub async fn latest_close<B>(broker: &B, contract: &QualifiedContract, days: u32) -> Option<Decimal>
where
    B: MarketData + ?Sized,
{
    match broker.daily_bars(contract, days).await {
        Ok(bars) => bars.last().map(|bar| bar.close),
        Err(e) => {
            warn!(contract = %contract.display_name(), error = %e, "Historical bars request failed");
            None
        }
    }
}

/// Representative price for `contract`.
///
/// Each attempt requests a fresh snapshot and takes the last trade, else the
/// bid/ask midpoint. Once attempts are exhausted the latest daily close is
/// used. Broker errors only consume an attempt.
pub async fn discover_price<B>(
    broker: &B,
    contract: &QualifiedContract,
    retry: &RetryPolicy,
    history_days: u32,
) -> PriceDiscovery
where
    B: MarketData + ?Sized,
{
    for attempt in 1..=retry.attempts {
        match broker.quote(contract).await {
            Ok(quote) => {
                if let Some((price, source)) = quoted_price(&quote) {
                    info!(contract = %contract.display_name(), %price, %source, attempt, "Price discovered");
                    return PriceDiscovery::Found { price, source };
                }
                debug!(contract = %contract.display_name(), attempt, "Quote had no usable last or midpoint");
            }
            Err(e) => {
                warn!(contract = %contract.display_name(), attempt, error = %e, "Quote request failed");
            }
        }

        if attempt < retry.attempts {
            tokio::time::sleep(retry.delay).await;
        }
    }

    if let Some(price) = latest_close(broker, contract, history_days).await {
        warn!(contract = %contract.display_name(), %price, "Falling back to historical close");
        return PriceDiscovery::Found {
            price,
            source: PriceSource::HistoricalClose,
        };
    }

    warn!(contract = %contract.display_name(), attempts = retry.attempts, "No usable price from any source");
    PriceDiscovery::Unavailable
}

/// Bid/ask midpoint only, retried like [`discover_price`] but without fallback.
pub async fn current_mid_price<B>(
    broker: &B,
    contract: &QualifiedContract,
    retry: &RetryPolicy,
) -> Option<Decimal>
where
    B: MarketData + ?Sized,
{
    for attempt in 1..=retry.attempts {
        match broker.quote(contract).await {
            Ok(quote) => {
                if let Some(mid) = quote.midpoint() {
                    return Some(mid);
                }
                debug!(contract = %contract.display_name(), attempt, "Quote missing a side");
            }
            Err(e) => {
                warn!(contract = %contract.display_name(), attempt, error = %e, "Quote request failed");
            }
        }

        if attempt < retry.attempts {
            tokio::time::sleep(retry.delay).await;
        }
    }
    None
}
