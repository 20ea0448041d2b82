//! Price discovery for a single contract.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use spread_trader_core::AppConfig;
use spread_trader_ib::MarketData;
use spread_trader_strategies::{current_mid_price, discover_price, PriceDiscovery, RetryPolicy};

use super::session::{connect, ContractArgs};

/// Arguments for the price command.
#[derive(Args, Debug)]
pub struct PriceArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Only report the bid/ask midpoint.
    #[arg(long)]
    pub mid_only: bool,
}

/// Runs the price command.
pub async fn run_price(args: PriceArgs, config: &AppConfig) -> Result<()> {
    let ib = connect(config).await?;
    let contract = args.contract.resolve(&ib).await?;
    let pricing = &config.pricing;
    let retry = RetryPolicy::from_config(pricing);

    println!("{}", contract.display_name());

    if args.mid_only {
        match current_mid_price(&ib, &contract, &retry).await {
            Some(mid) => println!("  mid:   {mid}"),
            None => println!("  mid:   unavailable"),
        }
        return Ok(());
    }

    match discover_price(&ib, &contract, &retry, pricing.history_days).await {
        PriceDiscovery::Found { price, source } => println!("  price: {price} ({source})"),
        PriceDiscovery::Unavailable => println!("  price: unavailable"),
    }

    if contract.spec.sec_type.is_option() {
        let wait = Duration::from_millis(pricing.model_wait_ms);
        match ib.model_price(&contract, wait).await? {
            Some(model) => println!("  model: {model}"),
            None => println!("  model: unavailable"),
        }
    }

    Ok(())
}
