//! End-to-end strategy run: resolve, price, select strikes, build, price, submit.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use spread_trader_ib::{
    Action, AdaptivePriority, Broker, Combo, ContractSpec, OptionRight, OrderTarget,
};
use tracing::{info, warn};

use crate::combo_pricing::{combo_mid, model_combo_price};
use crate::discovery::discover_price;
use crate::orders::{
    combo_limit_price, submit_adaptive_bracket, submit_limit, BracketOrder, LimitOrder,
};
use crate::strategies::{call_credit_spread, iron_condor, put_credit_spread, CondorStrikes};
use crate::strikes::StrikeSelector;
use crate::tick::round_to_tick;
use crate::types::{
    BracketReport, PriceDiscovery, RetryPolicy, StrategyKind, StrategyReport, StrategyRequest, StrategySettings,
    StrikePlan, TieBreak,
};
use crate::underlying::resolve_underlying;

/// Rounded aggregate of a combo plus the legs that could not be priced.
async fn price_combo<B>(broker: &B, combo: &Combo, settings: &StrategySettings) -> (Decimal, Vec<String>)
where
    B: Broker + ?Sized,
{
    let pricing = &settings.pricing;
    if pricing.use_model_price {
        let price = model_combo_price(broker, combo, pricing).await;
        (price.rounded, price.skipped_legs)
    } else {
        let tick = pricing.tick_size_for(&combo.symbol);
        let mid = combo_mid(broker, combo, tick, pricing.rounding).await;
        (mid.rounded, mid.missing_legs)
    }
}

fn required(strike: Result<Option<Decimal>>, what: &str, target: Decimal) -> Result<Decimal> {
    strike?.with_context(|| format!("No {what} strike near {target}"))
}

/// Run one strategy against `broker` and submit its order.
pub async fn run_strategy<B>(
    broker: &B,
    request: &StrategyRequest,
    settings: &StrategySettings,
) -> Result<StrategyReport>
where
    B: Broker + ?Sized,
{
    let cfg = &settings.strategy;
    let pricing = &settings.pricing;
    info!(
        strategy = %request.kind,
        symbol = %request.underlying.symbol,
        expiry = %request.expiry,
        live = request.live,
        "Running strategy"
    );

    let underlying = resolve_underlying(broker, &request.underlying, &request.expiry).await?;

    let retry = RetryPolicy::from_config(pricing);
    let (price, price_source) = match discover_price(broker, &underlying, &retry, pricing.history_days).await {
        PriceDiscovery::Found { price, source } => (price, source),
        PriceDiscovery::Unavailable => {
            bail!("No price available for underlying {}", underlying.display_name())
        }
    };
    info!(underlying = %underlying.display_name(), %price, source = %price_source, "Underlying priced");

    let selector = StrikeSelector::new(broker, &underlying.spec, &request.expiry)
        .max_quote_probes(pricing.max_quote_probes);

    let atm = required(selector.atm(price, TieBreak::PreferHigher).await, "ATM", price)?;
    let mut plan = StrikePlan {
        atm,
        ..StrikePlan::default()
    };

    let wants_puts = matches!(request.kind, StrategyKind::IronCondor | StrategyKind::PutCreditSpread);
    let wants_calls = matches!(request.kind, StrategyKind::IronCondor | StrategyKind::CallCreditSpread);

    if wants_puts {
        let short_target = price - cfg.short_put_offset;
        let long_target = price - cfg.long_put_width;
        plan.short_put = Some(if cfg.short_put_offset.is_zero() {
            atm
        } else {
            let pick = selector.pick(short_target, OptionRight::Put, TieBreak::PreferLower).await;
            required(pick, "short put", short_target)?
        });
        let pick = selector.pick(long_target, OptionRight::Put, TieBreak::PreferLower).await;
        plan.long_put = Some(required(pick, "long put", long_target)?);
    }
    if wants_calls {
        let short_target = price + cfg.short_call_offset;
        let long_target = price + cfg.long_call_width;
        plan.short_call = Some(if cfg.short_call_offset.is_zero() {
            atm
        } else {
            let pick = selector.pick(short_target, OptionRight::Call, TieBreak::PreferHigher).await;
            required(pick, "short call", short_target)?
        });
        let pick = selector.pick(long_target, OptionRight::Call, TieBreak::PreferHigher).await;
        plan.long_call = Some(required(pick, "long call", long_target)?);
    }
    info!(?plan, "Strikes selected");

    let combo = match (plan.long_put, plan.short_put, plan.short_call, plan.long_call) {
        (Some(long_put), Some(short_put), Some(short_call), Some(long_call)) => {
            let strikes = CondorStrikes {
                long_put,
                short_put,
                short_call,
                long_call,
            };
            iron_condor(broker, &underlying, &request.expiry, strikes).await?
        }
        (Some(long), Some(short), None, None) => {
            put_credit_spread(broker, &underlying, &request.expiry, short, long).await?
        }
        (None, None, Some(short), Some(long)) => {
            call_credit_spread(broker, &underlying, &request.expiry, short, long).await?
        }
        _ => bail!("Incomplete strike plan for {}", request.kind),
    };

    let (aggregate, unpriced_legs) = price_combo(broker, &combo, settings).await;
    if !unpriced_legs.is_empty() {
        if !pricing.allow_partial_pricing {
            bail!(
                "Refusing to submit {}: no price for {}",
                combo.display_name(),
                unpriced_legs.join(", ")
            );
        }
        warn!(legs = ?unpriced_legs, "Submitting partially priced combo");
    }

    let limit_price = combo_limit_price(aggregate);
    let order = LimitOrder {
        action: Action::Buy,
        quantity: cfg.quantity,
        limit_price,
        live: request.live,
        tag: cfg.tag.clone(),
    };
    let combo_name = combo.display_name();
    let ack = submit_limit(broker, &OrderTarget::Combo(combo), &order).await?;

    info!(
        strategy = %request.kind,
        order_id = ack.order_id,
        %aggregate,
        limit = %limit_price,
        status = %ack.status,
        "Strategy order submitted"
    );

    Ok(StrategyReport {
        kind: request.kind,
        underlying: underlying.display_name(),
        underlying_price: price,
        price_source,
        expiry: request.expiry.clone(),
        strikes: plan,
        combo: combo_name,
        aggregate_price: aggregate,
        limit_price,
        unpriced_legs,
        order: ack,
    })
}

/// Parameters for an adaptive bracket on a single contract.
#[derive(Debug, Clone)]
pub struct BracketRequest {
    pub contract: ContractSpec,
    pub action: Action,
    /// Entry limit; discovered from the market when `None`.
    pub limit_price: Option<Decimal>,
    pub priority: AdaptivePriority,
    pub trailing_percent: Decimal,
    pub live: bool,
}

/// Qualify a contract and enter it with an adaptive limit plus trailing stop.
pub async fn run_bracket<B>(
    broker: &B,
    request: &BracketRequest,
    settings: &StrategySettings,
) -> Result<BracketReport>
where
    B: Broker + ?Sized,
{
    let pricing = &settings.pricing;
    let contract = broker
        .qualify(&request.contract)
        .await
        .with_context(|| format!("Failed to qualify {}", request.contract.display_name()))?;

    let limit_price = match request.limit_price {
        Some(limit) => limit,
        None => {
            let retry = RetryPolicy::from_config(pricing);
            let discovered = discover_price(broker, &contract, &retry, pricing.history_days).await;
            let price = discovered
                .price()
                .with_context(|| format!("No price available for {}", contract.display_name()))?;
            round_to_tick(price, pricing.tick_size_for(contract.symbol()), pricing.rounding)
        }
    };

    let order = BracketOrder {
        action: request.action,
        quantity: settings.strategy.quantity,
        limit_price,
        priority: request.priority,
        trailing_percent: request.trailing_percent,
        live: request.live,
        tag: settings.strategy.tag.clone(),
    };
    let target = OrderTarget::Contract(contract);
    let ack = submit_adaptive_bracket(broker, &target, &order).await?;

    Ok(BracketReport {
        target: target.display_name(),
        limit_price,
        trailing_percent: request.trailing_percent,
        ack,
    })
}
