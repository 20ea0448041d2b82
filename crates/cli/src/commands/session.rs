//! Shared setup for commands: configuration, connection and contract arguments.

use anyhow::{Context, Result};
use clap::Args;
use rust_decimal::Decimal;
use spread_trader_core::{AppConfig, ConfigLoader};
use spread_trader_ib::{
    Broker, ContractSpec, IBClient, OptionRight, QualifiedContract, SecType,
};
use spread_trader_strategies::underlying::front_month_future;

/// Load configuration, layering an optional profile over the base file.
pub fn load_config(path: &str, profile: Option<&str>, readonly: bool) -> Result<AppConfig> {
    let mut config = match profile {
        Some(profile) => ConfigLoader::load_with_profile(profile),
        None => ConfigLoader::load_from(path),
    }
    .with_context(|| format!("Failed to load configuration from {path}"))?;

    if readonly {
        config.ib.readonly = true;
    }
    Ok(config)
}

pub async fn connect(config: &AppConfig) -> Result<IBClient> {
    IBClient::connect(config.ib.clone())
        .await
        .with_context(|| format!("Failed to connect to IB Gateway at {}", config.ib.connection_url()))
}

/// A contract given on the command line.
#[derive(Args, Debug, Clone)]
pub struct ContractArgs {
    /// Symbol (e.g., "SPX", "ES", "AAPL").
    #[arg(long)]
    pub symbol: String,

    /// Security type: STK, IND, FUT, OPT or FOP.
    #[arg(long, default_value = "IND")]
    pub sec_type: SecType,

    #[arg(long, default_value = "CBOE")]
    pub exchange: String,

    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Expiry (YYYYMMDD) or contract month (YYYYMM). Futures without one resolve to the front month.
    #[arg(long)]
    pub expiry: Option<String>,

    #[arg(long)]
    pub strike: Option<Decimal>,

    /// Option right: C or P.
    #[arg(long)]
    pub right: Option<OptionRight>,

    /// Contract multiplier (e.g., "50" for ES).
    #[arg(long, default_value = "")]
    pub multiplier: String,
}

impl ContractArgs {
    pub fn spec(&self) -> ContractSpec {
        let mut spec = ContractSpec::from_parts(&self.symbol, self.sec_type, &self.exchange, &self.currency)
            .with_multiplier(&self.multiplier);
        if let Some(expiry) = &self.expiry {
            spec = spec.with_expiry(expiry);
        }
        spec.strike = self.strike;
        spec.right = self.right;
        spec
    }

    /// Qualify the contract, resolving a bare future to its front month.
    pub async fn resolve<B>(&self, broker: &B) -> Result<QualifiedContract>
    where
        B: Broker + ?Sized,
    {
        if self.sec_type == SecType::Future && self.expiry.is_none() {
            return front_month_future(broker, &self.symbol, &self.exchange, &self.multiplier, &self.currency).await;
        }
        let spec = self.spec();
        broker
            .qualify(&spec)
            .await
            .with_context(|| format!("Failed to qualify {}", spec.display_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        contract: ContractArgs,
    }

    #[test]
    fn option_arguments_build_a_full_descriptor() {
        let harness = Harness::parse_from([
            "test", "--symbol", "spx", "--sec-type", "OPT", "--expiry", "20241108", "--strike",
            "5800", "--right", "P",
        ]);
        let spec = harness.contract.spec();
        assert_eq!(spec.display_name(), "SPX OPT 20241108 5800P @CBOE");
        assert!(spec.validate().is_ok());
    }
}
