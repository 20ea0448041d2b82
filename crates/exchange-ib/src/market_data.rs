//! Market data: quote snapshots, model prices and historical bars.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use ibapi::contracts::tick_types::TickType;
use ibapi::market_data::historical::ToDuration;
use ibapi::market_data::realtime::TickTypes;
use ibapi::prelude::{HistoricalBarSize, HistoricalWhatToShow, TradingHours};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::broker::MarketData;
use crate::client::IBClient;
use crate::convert::qualified_to_ib;
use crate::error::{IbError, Result};
use crate::types::{usable_price, PriceBar, PriceQuote, QualifiedContract};

fn apply_price(quote: &mut PriceQuote, tick_type: &TickType, raw: f64) {
    let Some(price) = usable_price(raw) else {
        return;
    };
    match tick_type {
        TickType::Bid | TickType::DelayedBid => quote.bid = Some(price),
        TickType::Ask | TickType::DelayedAsk => quote.ask = Some(price),
        TickType::Last | TickType::DelayedLast => quote.last = Some(price),
        TickType::Close | TickType::DelayedClose => quote.close = Some(price),
        _ => {}
    }
}

fn is_model_tick(tick_type: &TickType) -> bool {
    matches!(tick_type, TickType::ModelOption | TickType::DelayedModelOption)
}

#[async_trait]
impl MarketData for IBClient {
    async fn quote(&self, contract: &QualifiedContract) -> Result<PriceQuote> {
        debug!(contract = %contract.display_name(), "Requesting quote snapshot");

        let ib_contract = qualified_to_ib(contract);
        let mut subscription = self
            .inner()
            .market_data(&ib_contract)
            .snapshot()
            .subscribe()
            .await?;

        let mut quote = PriceQuote::default();
        let collect = async {
            while let Some(tick) = subscription.next().await {
                match tick? {
                    TickTypes::Price(tick) => apply_price(&mut quote, &tick.tick_type, tick.price),
                    TickTypes::PriceSize(tick) => {
                        apply_price(&mut quote, &tick.price_tick_type, tick.price);
                    }
                    TickTypes::OptionComputation(computation) if is_model_tick(&computation.field) => {
                        if let Some(price) = computation.option_price.and_then(usable_price) {
                            quote.model = Some(price);
                        }
                    }
                    TickTypes::SnapshotEnd => break,
                    _ => {}
                }
            }
            Ok::<(), IbError>(())
        };

        if tokio::time::timeout(self.snapshot_timeout(), collect).await.is_err() {
            warn!(contract = %contract.display_name(), "Snapshot did not complete in time, using partial quote");
        }
        // Errors inside the snapshot surface only when no tick arrived at all.
        if quote.is_empty() {
            return Err(IbError::NoData(contract.display_name()));
        }

        debug!(
            contract = %contract.display_name(),
            bid = ?quote.bid,
            ask = ?quote.ask,
            last = ?quote.last,
            "Quote snapshot received"
        );
        Ok(quote)
    }

    async fn model_price(
        &self,
        contract: &QualifiedContract,
        wait: Duration,
    ) -> Result<Option<Decimal>> {
        debug!(contract = %contract.display_name(), wait_ms = wait.as_millis() as u64, "Waiting for model price");

        let ib_contract = qualified_to_ib(contract);
        let mut subscription = self.inner().market_data(&ib_contract).subscribe().await?;

        let wait_for_model = async {
            while let Some(tick) = subscription.next().await {
                if let Ok(TickTypes::OptionComputation(computation)) = tick {
                    if is_model_tick(&computation.field) {
                        if let Some(price) = computation.option_price.and_then(usable_price) {
                            return Some(price);
                        }
                    }
                }
            }
            None
        };

        match tokio::time::timeout(wait, wait_for_model).await {
            Ok(price) => Ok(price),
            Err(_) => {
                debug!(contract = %contract.display_name(), "No model price within wait");
                Ok(None)
            }
        }
    }

    async fn daily_bars(&self, contract: &QualifiedContract, days: u32) -> Result<Vec<PriceBar>> {
        debug!(contract = %contract.display_name(), days, "Fetching historical daily bars");

        let ib_contract = qualified_to_ib(contract);
        let duration = i32::try_from(days.max(1)).unwrap_or(i32::MAX).days();
        let data = self
            .inner()
            .historical_data(
                &ib_contract,
                None,
                duration,
                HistoricalBarSize::Day,
                Some(HistoricalWhatToShow::Trades),
                TradingHours::Regular,
            )
            .await?;

        let mut bars = Vec::with_capacity(data.bars.len());
        for bar in &data.bars {
            let (Some(open), Some(high), Some(low), Some(close)) = (
                usable_price(bar.open),
                usable_price(bar.high),
                usable_price(bar.low),
                usable_price(bar.close),
            ) else {
                continue;
            };
            let Some(timestamp) = DateTime::from_timestamp(bar.date.unix_timestamp(), 0) else {
                continue;
            };
            bars.push(PriceBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: bar.volume.max(0.0) as u64,
            });
        }

        Ok(bars)
    }
}
