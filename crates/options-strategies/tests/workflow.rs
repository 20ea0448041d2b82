mod common;

use chrono::{TimeZone, Utc};
use common::{fast_settings, SpxBook, EXPIRY};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spread_trader_ib::{
    Action, AdaptivePriority, Combo, ContractSpec, IbError, OptionRight, OrderKind, OrderStatus,
    OrderTarget, PaperBroker, PriceBar, StrategyLeg,
};
use spread_trader_strategies::{
    model_combo_price, run_bracket, run_strategy, BracketRequest, PriceSource, StrategyKind,
    StrategyRequest, UnderlyingRequest,
};

fn request(kind: StrategyKind) -> StrategyRequest {
    StrategyRequest {
        kind,
        underlying: UnderlyingRequest::index("SPX", "CBOE"),
        expiry: EXPIRY.to_string(),
        live: false,
    }
}

fn quote_condor(book: &SpxBook) {
    book.set_spx_last(dec!(5800));
    book.quote_option(dec!(5800), OptionRight::Put, dec!(10.0), dec!(10.4));
    book.quote_option(dec!(5725), OptionRight::Put, dec!(2.0), dec!(2.2));
    book.quote_option(dec!(5800), OptionRight::Call, dec!(9.0), dec!(9.4));
    book.quote_option(dec!(5875), OptionRight::Call, dec!(1.5), dec!(1.7));
}

#[tokio::test]
async fn iron_condor_is_priced_and_staged() {
    let book = SpxBook::new();
    quote_condor(&book);

    let report = run_strategy(&book.broker, &request(StrategyKind::IronCondor), &fast_settings())
        .await
        .unwrap();

    assert_eq!(report.strikes.atm, dec!(5800));
    assert_eq!(report.strikes.long_put, Some(dec!(5725)));
    assert_eq!(report.strikes.long_call, Some(dec!(5875)));
    // bid 15.5, ask 15.9
    assert_eq!(report.aggregate_price, dec!(15.7));
    assert_eq!(report.limit_price, dec!(-15.7));
    assert_eq!(report.order.status, OrderStatus::PreSubmitted);

    let orders = book.broker.placed_orders();
    assert_eq!(orders.len(), 1);
    let ticket = &orders[0].ticket;
    assert_eq!(ticket.action, Action::Buy);
    assert!(!ticket.transmit);
    assert_eq!(ticket.order_ref, "spread-trader");
    assert_eq!(ticket.limit_price(), Some(dec!(-15.7)));

    let OrderTarget::Combo(combo) = &orders[0].target else {
        panic!("expected a combo order");
    };
    let actions: Vec<(Decimal, Action)> = combo
        .legs
        .iter()
        .map(|leg| (leg.contract.strike().unwrap(), leg.action))
        .collect();
    assert_eq!(
        actions,
        vec![
            (dec!(5800), Action::Sell),
            (dec!(5725), Action::Buy),
            (dec!(5800), Action::Sell),
            (dec!(5875), Action::Buy),
        ]
    );
}

#[tokio::test]
async fn unquoted_wing_moves_to_nearest_quoted_strike() {
    let book = SpxBook::new();
    book.set_spx_last(dec!(5800));
    book.quote_option(dec!(5800), OptionRight::Put, dec!(10.0), dec!(10.4));
    book.quote_option(dec!(5720), OptionRight::Put, dec!(1.8), dec!(2.0));
    book.quote_option(dec!(5730), OptionRight::Put, dec!(2.2), dec!(2.4));

    let report = run_strategy(&book.broker, &request(StrategyKind::PutCreditSpread), &fast_settings())
        .await
        .unwrap();

    // 5725 has no quote; 5720 and 5730 tie and the put side prefers lower.
    assert_eq!(report.strikes.long_put, Some(dec!(5720)));
    assert_eq!(report.strikes.short_put, Some(dec!(5800)));
    assert_eq!(report.strikes.short_call, None);
    assert_eq!(report.aggregate_price, dec!(8.3));
}

#[tokio::test]
async fn call_credit_spread_sells_the_lower_strike() {
    let book = SpxBook::new();
    quote_condor(&book);

    let report = run_strategy(&book.broker, &request(StrategyKind::CallCreditSpread), &fast_settings())
        .await
        .unwrap();

    let orders = book.broker.placed_orders();
    let OrderTarget::Combo(combo) = &orders[0].target else {
        panic!("expected a combo order");
    };
    assert_eq!(combo.legs[0].action, Action::Sell);
    assert_eq!(combo.legs[0].contract.strike(), Some(dec!(5800)));
    assert_eq!(combo.legs[1].action, Action::Buy);
    assert_eq!(combo.legs[1].contract.strike(), Some(dec!(5875)));
    // (9.0 - 1.5 + 9.4 - 1.7) / 2 = 7.6
    assert_eq!(report.aggregate_price, dec!(7.6));
}

#[tokio::test]
async fn partially_priced_combo_is_refused() {
    let book = SpxBook::new();
    quote_condor(&book);
    let mut settings = fast_settings();
    settings.pricing.use_model_price = true;
    settings.pricing.max_quote_probes = 0;

    // The long call has no model, no quote and no bars once its quote is wiped.
    let long_call = book.option(dec!(5875), OptionRight::Call);
    book.broker.script_quotes(&long_call, vec![]);

    let err = run_strategy(&book.broker, &request(StrategyKind::IronCondor), &settings)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Refusing to submit"), "{err:#}");
    assert!(book.broker.placed_orders().is_empty());

    settings.pricing.allow_partial_pricing = true;
    let report = run_strategy(&book.broker, &request(StrategyKind::IronCondor), &settings)
        .await
        .unwrap();
    assert_eq!(report.unpriced_legs.len(), 1);
    assert_eq!(book.broker.placed_orders().len(), 1);
}

#[tokio::test]
async fn model_prices_take_precedence_over_mids() {
    let book = SpxBook::new();
    quote_condor(&book);
    let mut settings = fast_settings();
    settings.pricing.use_model_price = true;

    book.broker.set_model_price(&book.option(dec!(5800), OptionRight::Put), dec!(10.12));
    book.broker.set_model_price(&book.option(dec!(5725), OptionRight::Put), dec!(2.05));

    let report = run_strategy(&book.broker, &request(StrategyKind::PutCreditSpread), &settings)
        .await
        .unwrap();
    // 10.12 - 2.05 = 8.07 on a 0.10 tick
    assert_eq!(report.aggregate_price, dec!(8.1));
}

#[tokio::test]
async fn model_pricing_falls_back_per_leg() {
    let book = SpxBook::new();
    let short_put = book.option(dec!(5800), OptionRight::Put);
    let long_put = book.option(dec!(5725), OptionRight::Put);
    let long_call = book.option(dec!(5875), OptionRight::Call);

    book.broker.set_model_price(&short_put, dec!(10.12));
    book.quote_option(dec!(5725), OptionRight::Put, dec!(2.0), dec!(2.2));
    book.broker.set_daily_bars(
        &long_call,
        vec![PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 11, 7, 21, 0, 0).unwrap(),
            open: dec!(1.6),
            high: dec!(1.7),
            low: dec!(1.4),
            close: dec!(1.45),
            volume: 120,
        }],
    );

    let combo = Combo::new(
        &book.spx,
        vec![
            StrategyLeg::new(short_put, Action::Sell, 1),
            StrategyLeg::new(long_put, Action::Buy, 1),
            StrategyLeg::new(long_call, Action::Buy, 1),
        ],
    )
    .unwrap();

    let price = model_combo_price(&book.broker, &combo, &fast_settings().pricing).await;
    let sources: Vec<_> = price.legs.iter().map(|leg| leg.source).collect();
    assert_eq!(
        sources,
        vec![PriceSource::Model, PriceSource::Midpoint, PriceSource::HistoricalClose]
    );
    assert_eq!(price.legs[1].price, dec!(2.1));
    assert_eq!(price.legs[2].price, dec!(1.45));
    assert!(price.is_complete());
    // 10.12 - 2.10 - 1.45
    assert_eq!(price.total, dec!(6.57));
    assert_eq!(price.rounded, dec!(6.6));
}

#[tokio::test]
async fn unavailable_underlying_price_stops_the_run() {
    let book = SpxBook::new();
    let err = run_strategy(&book.broker, &request(StrategyKind::IronCondor), &fast_settings())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No price available"));
    assert_eq!(book.broker.quote_requests(&book.spx), 3);
}

#[tokio::test]
async fn readonly_session_refuses_to_submit() {
    let book = SpxBook::with_broker(PaperBroker::readonly());
    quote_condor(&book);

    let err = run_strategy(&book.broker, &request(StrategyKind::IronCondor), &fast_settings())
        .await
        .unwrap_err();
    assert!(matches!(err.root_cause().downcast_ref::<IbError>(), Some(IbError::ReadOnly(_))));
}

#[tokio::test]
async fn live_bracket_links_trailing_child() {
    let book = SpxBook::new();
    quote_condor(&book);

    let request = BracketRequest {
        contract: ContractSpec::option_on(&book.spx.spec, EXPIRY, dec!(5800), OptionRight::Put),
        action: Action::Buy,
        limit_price: None,
        priority: AdaptivePriority::Patient,
        trailing_percent: dec!(15),
        live: true,
    };
    let report = run_bracket(&book.broker, &request, &fast_settings()).await.unwrap();

    // mid 10.2 on the SPX 0.10 grid
    assert_eq!(report.limit_price, dec!(10.2));

    let orders = book.broker.placed_orders();
    assert_eq!(orders.len(), 2);
    let (parent, child) = (&orders[0].ticket, &orders[1].ticket);
    assert_eq!(parent.adaptive, Some(AdaptivePriority::Patient));
    assert!(!parent.transmit);
    assert_eq!(child.action, Action::Sell);
    assert!(child.transmit);
    assert_eq!(child.parent_id, Some(report.ack.parent.order_id));
    assert_eq!(
        child.kind,
        OrderKind::TrailingStop {
            trailing_percent: dec!(15)
        }
    );
}
