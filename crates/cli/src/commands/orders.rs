//! Active orders and filled executions.

use anyhow::Result;
use clap::{Args, Subcommand};
use spread_trader_core::AppConfig;
use spread_trader_strategies::orders::{active_orders, filled_orders};
use spread_trader_strategies::Timeframe;

use super::session::connect;

/// Arguments for the orders command.
#[derive(Args, Debug)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub view: OrdersView,
}

#[derive(Subcommand, Debug)]
pub enum OrdersView {
    /// Working orders in the account
    Active,
    /// Executions in a day window
    Filled {
        /// today, yesterday or YYYY-MM-DD
        #[arg(long, default_value = "today")]
        timeframe: Timeframe,
    },
}

/// Runs the orders command.
pub async fn run_orders(args: OrdersArgs, config: &AppConfig) -> Result<()> {
    let ib = connect(config).await?;

    match args.view {
        OrdersView::Active => {
            let orders = active_orders(&ib).await?;
            println!("{} active order(s)", orders.len());
            for order in orders {
                let limit = order.limit_price.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
                println!(
                    "  #{:<8} {:<6} {:<4} {:>4} {:<5} limit {:<8} {:<13} {}",
                    order.order_id,
                    order.symbol,
                    order.action,
                    order.quantity,
                    order.order_type,
                    limit,
                    order.status,
                    order.order_ref
                );
            }
        }
        OrdersView::Filled { timeframe } => {
            let fills = filled_orders(&ib, timeframe).await?;
            println!("{} fill(s) {timeframe}", fills.len());
            for fill in fills {
                println!(
                    "  {} #{:<8} {:<4} {} {} @ {}",
                    fill.time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
                    fill.order_id,
                    fill.side,
                    fill.shares,
                    if fill.local_symbol.is_empty() { &fill.symbol } else { &fill.local_symbol },
                    fill.avg_price
                );
            }
        }
    }
    Ok(())
}
