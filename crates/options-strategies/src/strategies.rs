//! Multi-leg strategy builders.

use anyhow::{ensure, Context, Result};
use rust_decimal::Decimal;
use spread_trader_ib::{
    Action, Combo, ContractResolver, ContractSpec, OptionRight, QualifiedContract, StrategyLeg,
};
use tracing::info;

/// Strikes of a four-leg iron condor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondorStrikes {
    pub long_put: Decimal,
    pub short_put: Decimal,
    pub short_call: Decimal,
    pub long_call: Decimal,
}

async fn option_leg<B>(
    broker: &B,
    underlying: &QualifiedContract,
    expiry: &str,
    strike: Decimal,
    right: OptionRight,
    action: Action,
) -> Result<StrategyLeg>
where
    B: ContractResolver + ?Sized,
{
    let spec = ContractSpec::option_on(&underlying.spec, expiry, strike, right);
    let contract = broker
        .qualify(&spec)
        .await
        .with_context(|| format!("Failed to qualify leg {}", spec.display_name()))?;
    Ok(StrategyLeg::new(contract, action, 1))
}

/// SELL put @short_put, BUY put @long_put, SELL call @short_call, BUY call @long_call.
pub async fn iron_condor<B>(
    broker: &B,
    underlying: &QualifiedContract,
    expiry: &str,
    strikes: CondorStrikes,
) -> Result<Combo>
where
    B: ContractResolver + ?Sized,
{
    ensure!(
        strikes.long_put < strikes.short_put,
        "long put {} must be below short put {}",
        strikes.long_put,
        strikes.short_put
    );
    ensure!(
        strikes.short_call < strikes.long_call,
        "long call {} must be above short call {}",
        strikes.long_call,
        strikes.short_call
    );

    let legs = vec![
        option_leg(broker, underlying, expiry, strikes.short_put, OptionRight::Put, Action::Sell).await?,
        option_leg(broker, underlying, expiry, strikes.long_put, OptionRight::Put, Action::Buy).await?,
        option_leg(broker, underlying, expiry, strikes.short_call, OptionRight::Call, Action::Sell).await?,
        option_leg(broker, underlying, expiry, strikes.long_call, OptionRight::Call, Action::Buy).await?,
    ];

    let combo = Combo::new(underlying, legs)?;
    info!(combo = %combo.display_name(), "Iron condor built");
    Ok(combo)
}

/// SELL put @short, BUY put @long (below it).
pub async fn put_credit_spread<B>(
    broker: &B,
    underlying: &QualifiedContract,
    expiry: &str,
    short: Decimal,
    long: Decimal,
) -> Result<Combo>
where
    B: ContractResolver + ?Sized,
{
    ensure!(long < short, "long put {long} must be below short put {short}");

    let legs = vec![
        option_leg(broker, underlying, expiry, short, OptionRight::Put, Action::Sell).await?,
        option_leg(broker, underlying, expiry, long, OptionRight::Put, Action::Buy).await?,
    ];

    let combo = Combo::new(underlying, legs)?;
    info!(combo = %combo.display_name(), "Put credit spread built");
    Ok(combo)
}

/// SELL call @short, BUY call @long (above it).
pub async fn call_credit_spread<B>(
    broker: &B,
    underlying: &QualifiedContract,
    expiry: &str,
    short: Decimal,
    long: Decimal,
) -> Result<Combo>
where
    B: ContractResolver + ?Sized,
{
    ensure!(long > short, "long call {long} must be above short call {short}");

    let legs = vec![
        option_leg(broker, underlying, expiry, short, OptionRight::Call, Action::Sell).await?,
        option_leg(broker, underlying, expiry, long, OptionRight::Call, Action::Buy).await?,
    ];

    let combo = Combo::new(underlying, legs)?;
    info!(combo = %combo.display_name(), "Call credit spread built");
    Ok(combo)
}
