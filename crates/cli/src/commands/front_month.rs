//! Front-month future lookup.

use anyhow::Result;
use clap::Args;
use spread_trader_core::AppConfig;
use spread_trader_strategies::underlying::{front_month_future, front_month_with_expiry};

use super::session::connect;

/// Arguments for the front-month command.
#[derive(Args, Debug)]
pub struct FrontMonthArgs {
    #[arg(long, default_value = "ES")]
    pub symbol: String,

    #[arg(long, default_value = "CME")]
    pub exchange: String,

    #[arg(long, default_value = "50")]
    pub multiplier: String,

    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Require an option chain listing this expiry (YYYYMMDD).
    #[arg(long)]
    pub expiry: Option<String>,
}

/// Runs the front-month command.
pub async fn run_front_month(args: FrontMonthArgs, config: &AppConfig) -> Result<()> {
    let ib = connect(config).await?;
    let symbol = args.symbol.to_uppercase();

    let future = match &args.expiry {
        Some(expiry) => {
            front_month_with_expiry(&ib, &symbol, &args.exchange, &args.multiplier, &args.currency, expiry)
                .await?
        }
        None => front_month_future(&ib, &symbol, &args.exchange, &args.multiplier, &args.currency).await?,
    };

    println!("{}", future.display_name());
    if !future.local_symbol.is_empty() {
        println!("  local symbol: {}", future.local_symbol);
    }
    println!("  last trade:   {}", future.spec.expiry);
    Ok(())
}
