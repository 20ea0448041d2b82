//! Credit spreads held in the account.

use anyhow::Result;
use clap::Args;
use spread_trader_core::AppConfig;
use spread_trader_strategies::spreads::position_spreads;
use spread_trader_strategies::underlying::today_expiry;
use spread_trader_strategies::CreditSpread;

use super::session::connect;

/// Arguments for the spreads command.
#[derive(Args, Debug)]
pub struct SpreadsArgs {
    #[arg(long, default_value = "SPX")]
    pub symbol: String,

    /// Expiry (YYYYMMDD); defaults to today.
    #[arg(long)]
    pub expiry: Option<String>,
}

fn print_spread(spread: &CreditSpread) {
    println!(
        "  short {}{} x{}  long {}{} x{}  width {}",
        spread.short_strike,
        spread.right,
        spread.short.position.abs(),
        spread.long_strike,
        spread.right,
        spread.long.position,
        spread.width()
    );
}

/// Runs the spreads command.
pub async fn run_spreads(args: SpreadsArgs, config: &AppConfig) -> Result<()> {
    let ib = connect(config).await?;
    let expiry = args.expiry.unwrap_or_else(today_expiry);
    let scan = position_spreads(&ib, &args.symbol.to_uppercase(), &expiry).await?;

    println!("Call credit spreads ({}):", scan.call_credit.len());
    scan.call_credit.iter().for_each(print_spread);
    println!("Put credit spreads ({}):", scan.put_credit.len());
    scan.put_credit.iter().for_each(print_spread);
    Ok(())
}
