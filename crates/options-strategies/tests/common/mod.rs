#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spread_trader_ib::{ContractSpec, OptionRight, PaperBroker, PriceQuote, QualifiedContract};
use spread_trader_strategies::StrategySettings;

pub const EXPIRY: &str = "20241108";

/// SPX on CBOE with 5-point strikes from 5700 to 5900 for both rights.
pub struct SpxBook {
    pub broker: PaperBroker,
    pub spx: QualifiedContract,
}

impl SpxBook {
    pub fn new() -> Self {
        Self::with_broker(PaperBroker::new())
    }

    pub fn with_broker(broker: PaperBroker) -> Self {
        let spx = broker.register(ContractSpec::index("SPX", "CBOE"));
        let mut strike = dec!(5700);
        while strike <= dec!(5900) {
            for right in [OptionRight::Put, OptionRight::Call] {
                broker.register(ContractSpec::option_on(&spx.spec, EXPIRY, strike, right));
            }
            strike += dec!(5);
        }
        Self { broker, spx }
    }

    pub fn option(&self, strike: Decimal, right: OptionRight) -> QualifiedContract {
        let spec = ContractSpec::option_on(&self.spx.spec, EXPIRY, strike, right);
        find_registered(&self.broker, &spec)
    }

    pub fn quote_option(&self, strike: Decimal, right: OptionRight, bid: Decimal, ask: Decimal) {
        let contract = self.option(strike, right);
        self.broker.set_quote(&contract, PriceQuote::bid_ask(bid, ask));
    }

    pub fn set_spx_last(&self, last: Decimal) {
        self.broker.set_quote(
            &self.spx,
            PriceQuote {
                last: Some(last),
                ..PriceQuote::default()
            },
        );
    }
}

/// Registered contract matching `spec` exactly.
fn find_registered(broker: &PaperBroker, spec: &ContractSpec) -> QualifiedContract {
    broker
        .registered()
        .into_iter()
        .find(|c| &c.spec == spec)
        .expect("contract registered")
}

/// Settings with no retry delay and mid-based pricing.
pub fn fast_settings() -> StrategySettings {
    let mut settings = StrategySettings::default();
    settings.pricing.retry_delay_ms = 0;
    settings.pricing.model_wait_ms = 0;
    settings.pricing.use_model_price = false;
    settings
}
