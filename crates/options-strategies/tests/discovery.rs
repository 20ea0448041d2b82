mod common;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::SpxBook;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spread_trader_ib::{
    Action, ContractSpec, ExecutionReport, OptionChainParams, OptionRight, PaperBroker,
    PositionRecord, PriceBar, PriceQuote, QualifiedContract,
};
use spread_trader_strategies::orders::{active_orders, filled_orders};
use spread_trader_strategies::spreads::position_spreads;
use spread_trader_strategies::underlying::{front_month_future, front_month_with_expiry};
use spread_trader_strategies::{
    current_mid_price, discover_price, PriceDiscovery, PriceSource, RetryPolicy, StrikeSelector,
    TieBreak, Timeframe,
};

fn no_delay(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::ZERO)
}

fn bar(close: Decimal) -> PriceBar {
    PriceBar {
        timestamp: Utc.with_ymd_and_hms(2024, 11, 7, 21, 0, 0).unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 0,
    }
}

#[tokio::test]
async fn retry_consumes_successive_quotes() {
    let book = SpxBook::new();
    book.broker.fail_next_quotes(&book.spx, 1);
    book.broker.script_quotes(
        &book.spx,
        vec![
            PriceQuote::default(),
            PriceQuote {
                last: Some(dec!(5801.5)),
                ..PriceQuote::default()
            },
        ],
    );

    let found = discover_price(&book.broker, &book.spx, &no_delay(3), 5).await;
    assert_eq!(
        found,
        PriceDiscovery::Found {
            price: dec!(5801.5),
            source: PriceSource::Last
        }
    );
    assert_eq!(book.broker.quote_requests(&book.spx), 3);
}

#[tokio::test]
async fn historical_close_runs_once_after_attempts() {
    let book = SpxBook::new();
    book.broker.set_quote(&book.spx, PriceQuote::default());
    book.broker.set_daily_bars(&book.spx, vec![bar(dec!(5790)), bar(dec!(5795.25))]);

    let found = discover_price(&book.broker, &book.spx, &no_delay(2), 5).await;
    assert_eq!(found.price(), Some(dec!(5795.25)));
    assert_eq!(found.source(), Some(PriceSource::HistoricalClose));
    assert_eq!(book.broker.quote_requests(&book.spx), 2);
}

#[tokio::test]
async fn every_source_invalid_is_unavailable() {
    let book = SpxBook::new();
    book.broker.set_quote(
        &book.spx,
        PriceQuote {
            bid: Some(dec!(5799)),
            close: Some(dec!(5790)),
            ..PriceQuote::default()
        },
    );

    let outcome = discover_price(&book.broker, &book.spx, &no_delay(2), 5).await;
    assert_eq!(outcome, PriceDiscovery::Unavailable);
    assert_eq!(current_mid_price(&book.broker, &book.spx, &no_delay(2)).await, None);
}

#[tokio::test]
async fn zero_price_is_found() {
    let book = SpxBook::new();
    let put = book.option(dec!(5700), OptionRight::Put);
    book.broker.set_quote(&put, PriceQuote::bid_ask(dec!(0), dec!(0)));

    let found = discover_price(&book.broker, &put, &no_delay(1), 5).await;
    assert_eq!(
        found,
        PriceDiscovery::Found {
            price: dec!(0),
            source: PriceSource::Midpoint
        }
    );
    assert_eq!(current_mid_price(&book.broker, &put, &no_delay(1)).await, Some(dec!(0)));
}

#[tokio::test]
async fn selector_lists_distinct_strikes_and_respects_probe_limit() {
    let book = SpxBook::new();
    let selector = StrikeSelector::new(&book.broker, &book.spx.spec, common::EXPIRY).max_quote_probes(2);

    let strikes = selector.strikes(None).await.unwrap();
    assert_eq!(strikes.len(), 41);
    assert_eq!(selector.atm(dec!(5802.5), TieBreak::PreferHigher).await.unwrap(), Some(dec!(5805)));
    assert_eq!(selector.atm(dec!(5802.5), TieBreak::PreferLower).await.unwrap(), Some(dec!(5800)));

    // Only the third-nearest call is quoted, beyond the probe limit.
    book.quote_option(dec!(5805), OptionRight::Call, dec!(5), dec!(5.2));
    let quoted = selector
        .closest_quoted(dec!(5800), OptionRight::Call, TieBreak::PreferLower)
        .await
        .unwrap();
    assert!(quoted.is_none());

    let wider = StrikeSelector::new(&book.broker, &book.spx.spec, common::EXPIRY).max_quote_probes(3);
    let quoted = wider
        .closest_quoted(dec!(5800), OptionRight::Call, TieBreak::PreferLower)
        .await
        .unwrap();
    assert_eq!(quoted.and_then(|c| c.strike()), Some(dec!(5805)));
}

fn chain(future: &QualifiedContract, expirations: &[&str]) -> OptionChainParams {
    OptionChainParams {
        exchange: "CME".into(),
        trading_class: "ES".into(),
        multiplier: "50".into(),
        underlying_con_id: future.con_id,
        expirations: expirations.iter().map(|e| e.to_string()).collect(),
        strikes: vec![dec!(5800)],
    }
}

#[tokio::test]
async fn front_month_follows_the_chain() {
    let broker = PaperBroker::new();
    let dec_future = broker.register(ContractSpec::future("ES", "CME", "20241220", "50"));
    let mar_future = broker.register(ContractSpec::future("ES", "CME", "20250321", "50"));
    broker.add_option_chain(&dec_future, chain(&dec_future, &["20241108", "20241115"]));
    broker.add_option_chain(&mar_future, chain(&mar_future, &["20250117"]));

    let front = front_month_future(&broker, "ES", "CME", "50", "USD").await.unwrap();
    assert_eq!(front.con_id, dec_future.con_id);

    let with_expiry = front_month_with_expiry(&broker, "ES", "CME", "50", "USD", "20250117")
        .await
        .unwrap();
    assert_eq!(with_expiry.con_id, mar_future.con_id);

    assert!(front_month_with_expiry(&broker, "ES", "CME", "50", "USD", "20260101")
        .await
        .is_err());
    assert!(front_month_future(&broker, "NQ", "CME", "20", "USD").await.is_err());
}

#[tokio::test]
async fn fills_are_filtered_by_timeframe() {
    let broker = PaperBroker::new();
    let report = |order_id: i32, time| ExecutionReport {
        order_id,
        execution_id: format!("e{order_id}"),
        symbol: "SPX".into(),
        local_symbol: String::new(),
        side: Action::Buy,
        shares: dec!(1),
        avg_price: dec!(-3.1),
        time,
    };
    broker.add_execution(report(1, Utc::now()));
    broker.add_execution(report(2, Utc::now() - chrono::Duration::days(3)));

    let today = filled_orders(&broker, Timeframe::Today).await.unwrap();
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].order_id, 1);
    assert!(active_orders(&broker).await.unwrap().is_empty());
}

#[tokio::test]
async fn spreads_are_scanned_from_positions() {
    let book = SpxBook::new();
    let position = |strike, right, qty| PositionRecord {
        account: "DU1".into(),
        contract: book.option(strike, right),
        position: qty,
        avg_cost: dec!(250),
    };
    book.broker.add_position(position(dec!(5850), OptionRight::Call, dec!(-1)));
    book.broker.add_position(position(dec!(5900), OptionRight::Call, dec!(1)));
    book.broker.add_position(position(dec!(5750), OptionRight::Put, dec!(-2)));
    book.broker.add_position(position(dec!(5700), OptionRight::Put, dec!(2)));

    let scan = position_spreads(&book.broker, "SPX", common::EXPIRY).await.unwrap();
    assert_eq!(scan.call_credit.len(), 1);
    assert_eq!(scan.put_credit.len(), 1);
    assert_eq!(scan.put_credit[0].width(), dec!(50));
}
