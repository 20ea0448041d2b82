use clap::{Parser, Subcommand};

mod commands;

use commands::{
    BracketArgs, FrontMonthArgs, OrdersArgs, PriceArgs, SpreadsArgs, StrategyArgs,
};
use spread_trader_strategies::StrategyKind;

#[derive(Parser)]
#[command(name = "spread-trader")]
#[command(about = "Options spread trading against Interactive Brokers", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: String,

    /// Config profile layered over the base file (e.g., "paper", "live")
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<String>,

    /// Refuse to place orders for this session
    #[arg(long, global = true)]
    readonly: bool,

    /// Transmit orders; without it they are staged in TWS
    #[arg(long, global = true)]
    live: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the current price of a contract
    Price(PriceArgs),
    /// Open an iron condor around the underlying price
    IronCondor(StrategyArgs),
    /// Open a put credit spread below the underlying price
    PutCreditSpread(StrategyArgs),
    /// Open a call credit spread above the underlying price
    CallCreditSpread(StrategyArgs),
    /// Adaptive limit entry with a trailing stop
    Bracket(BracketArgs),
    /// List active orders or fills
    Orders(OrdersArgs),
    /// Show credit spreads held in the account
    Spreads(SpreadsArgs),
    /// Resolve the front-month future
    FrontMonth(FrontMonthArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let config = commands::load_config(&cli.config, cli.profile.as_deref(), cli.readonly)?;
    tracing::debug!(
        host = %config.ib.host,
        port = config.ib.port,
        readonly = config.ib.readonly,
        live = cli.live,
        "Session configured"
    );

    match cli.command {
        Commands::Price(args) => commands::run_price(args, &config).await?,
        Commands::IronCondor(args) => {
            commands::run_strategy_command(StrategyKind::IronCondor, args, &config, cli.live).await?;
        }
        Commands::PutCreditSpread(args) => {
            commands::run_strategy_command(StrategyKind::PutCreditSpread, args, &config, cli.live)
                .await?;
        }
        Commands::CallCreditSpread(args) => {
            commands::run_strategy_command(StrategyKind::CallCreditSpread, args, &config, cli.live)
                .await?;
        }
        Commands::Bracket(args) => commands::run_bracket_command(args, &config, cli.live).await?,
        Commands::Orders(args) => commands::run_orders(args, &config).await?,
        Commands::Spreads(args) => commands::run_spreads(args, &config).await?,
        Commands::FrontMonth(args) => commands::run_front_month(args, &config).await?,
    }

    Ok(())
}
