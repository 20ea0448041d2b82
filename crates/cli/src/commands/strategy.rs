//! Iron condor and credit spread commands.

use anyhow::Result;
use clap::Args;
use spread_trader_core::AppConfig;
use spread_trader_ib::SecType;
use spread_trader_strategies::underlying::today_expiry;
use spread_trader_strategies::{
    run_strategy, StrategyKind, StrategyReport, StrategyRequest, StrategySettings,
    UnderlyingRequest,
};

use super::session::connect;

/// Arguments shared by the strategy commands.
#[derive(Args, Debug)]
pub struct StrategyArgs {
    /// Underlying symbol.
    #[arg(long, default_value = "SPX")]
    pub symbol: String,

    /// Underlying security type: IND, STK or FUT.
    #[arg(long, default_value = "IND")]
    pub sec_type: SecType,

    #[arg(long, default_value = "CBOE")]
    pub exchange: String,

    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Futures multiplier (e.g., "50" for ES).
    #[arg(long, default_value = "")]
    pub multiplier: String,

    /// Option expiry (YYYYMMDD); defaults to today.
    #[arg(long)]
    pub expiry: Option<String>,

    /// Override the configured quantity.
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StrategyArgs {
    fn request(&self, kind: StrategyKind, live: bool) -> StrategyRequest {
        StrategyRequest {
            kind,
            underlying: UnderlyingRequest {
                symbol: self.symbol.to_uppercase(),
                sec_type: self.sec_type,
                exchange: self.exchange.clone(),
                currency: self.currency.to_uppercase(),
                multiplier: self.multiplier.clone(),
            },
            expiry: self.expiry.clone().unwrap_or_else(today_expiry),
            live,
        }
    }
}

fn print_report(report: &StrategyReport) {
    println!("=== {} on {} ===", report.kind, report.underlying);
    println!("  Expiry:      {}", report.expiry);
    println!("  Underlying:  {} ({})", report.underlying_price, report.price_source);
    println!("  ATM strike:  {}", report.strikes.atm);
    for (label, strike) in [
        ("Long put", report.strikes.long_put),
        ("Short put", report.strikes.short_put),
        ("Short call", report.strikes.short_call),
        ("Long call", report.strikes.long_call),
    ] {
        if let Some(strike) = strike {
            println!("  {label:<12} {strike}");
        }
    }
    println!("  Combo:       {}", report.combo);
    println!("  Net credit:  {}", report.aggregate_price);
    println!("  BUY limit:   {}", report.limit_price);
    if !report.unpriced_legs.is_empty() {
        println!("  Unpriced:    {}", report.unpriced_legs.join(", "));
    }
    println!("  Order:       #{} {}", report.order.order_id, report.order.status);
}

/// Runs one strategy against IB.
pub async fn run_strategy_command(
    kind: StrategyKind,
    args: StrategyArgs,
    config: &AppConfig,
    live: bool,
) -> Result<()> {
    let mut settings = StrategySettings::from(config);
    if let Some(quantity) = args.quantity {
        settings.strategy.quantity = quantity;
    }

    let ib = connect(config).await?;
    let report = run_strategy(&ib, &args.request(kind, live), &settings).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
