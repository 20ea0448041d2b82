//! Adaptive entry with a trailing stop on one contract.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use spread_trader_core::AppConfig;
use spread_trader_ib::{Action, AdaptivePriority};
use spread_trader_strategies::{run_bracket, BracketRequest, StrategySettings};

use super::session::{connect, ContractArgs};

/// Arguments for the bracket command.
#[derive(Args, Debug)]
pub struct BracketArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Entry side: BUY or SELL.
    #[arg(long, default_value = "BUY")]
    pub action: Action,

    /// Entry limit; discovered from the market when omitted.
    #[arg(long)]
    pub limit: Option<Decimal>,

    /// Trailing stop distance in percent.
    #[arg(long, default_value = "10")]
    pub trail_percent: Decimal,

    /// Adaptive algo priority: urgent, normal or patient.
    #[arg(long, default_value = "normal")]
    pub priority: AdaptivePriority,
}

/// Runs the bracket command.
pub async fn run_bracket_command(args: BracketArgs, config: &AppConfig, live: bool) -> Result<()> {
    let ib = connect(config).await?;
    let contract = args.contract.resolve(&ib).await?;
    let request = BracketRequest {
        contract: contract.spec,
        action: args.action,
        limit_price: args.limit,
        priority: args.priority,
        trailing_percent: args.trail_percent,
        live,
    };

    let report = run_bracket(&ib, &request, &StrategySettings::from(config)).await?;

    println!("=== Adaptive bracket on {} ===", report.target);
    println!("  Limit:     {}", report.limit_price);
    println!("  Trail:     {}%", report.trailing_percent);
    println!("  Parent:    #{} {}", report.ack.parent.order_id, report.ack.parent.status);
    println!("  Stop:      #{} {}", report.ack.child.order_id, report.ack.child.status);
    Ok(())
}
