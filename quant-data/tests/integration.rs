use chrono::{DateTime, Duration, Utc};
use quant_data::{BarInput, BarQuery, DataPlatform};
use quant_instrument::{CorporateAction, CorporateActionKind, Timeframe};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

fn day_bar(ts: DateTime<Utc>, close: Decimal) -> BarInput {
    BarInput {
        internal_id: None,
        ticker: Some("AAPL".into()),
        timestamp: ts,
        timeframe: Timeframe::Day1,
        open: close,
        high: close,
        low: close,
        close,
        volume: dec!(1_000_000),
        timestamp_knowledge: Some(ts),
    }
}

/// S1 — split adjustment.
#[test]
fn s1_split_adjustment() {
    let platform = DataPlatform::new();
    let t1 = Utc::now();
    let t2 = t1 + Duration::days(1);
    let t3 = t2 + Duration::days(1);

    platform.add_bars(vec![
        day_bar(t1, dec!(100)),
        day_bar(t2, dec!(50)),
        day_bar(t3, dec!(50)),
    ]);

    let id = platform.get_internal_id("AAPL", t1);
    platform.add_ca(vec![CorporateAction::new(id, t2, CorporateActionKind::Split, dec!(2))]);

    let bars = platform.get_bars(
        &[id],
        BarQuery {
            start: t1,
            end: t3,
            timeframe: Timeframe::Day1,
            as_of: None,
            adjust: true,
        },
    );

    let at_t1 = bars.iter().find(|b| b.timestamp == t1).unwrap();
    assert_eq!(at_t1.close, dec!(50));
}

/// S2 — restatement.
#[test]
fn s2_restatement() {
    let platform = DataPlatform::new();
    let t = Utc::now();

    let id = platform.register_security("AAPL", t - Duration::days(1), t + Duration::days(365), Value::Null);

    platform.add_bars(vec![BarInput {
        internal_id: Some(id),
        ticker: None,
        timestamp: t,
        timeframe: Timeframe::Day1,
        open: dec!(100),
        high: dec!(100),
        low: dec!(100),
        close: dec!(100),
        volume: dec!(1_000_000),
        timestamp_knowledge: Some(t),
    }]);
    platform.add_bars(vec![BarInput {
        internal_id: Some(id),
        ticker: None,
        timestamp: t,
        timeframe: Timeframe::Day1,
        open: dec!(105),
        high: dec!(105),
        low: dec!(105),
        close: dec!(105),
        volume: dec!(1_000_000),
        timestamp_knowledge: Some(t + Duration::hours(1)),
    }]);

    let at = |as_of: DateTime<Utc>| {
        platform
            .get_bars(
                &[id],
                BarQuery {
                    start: t - Duration::days(1),
                    end: t + Duration::days(1),
                    timeframe: Timeframe::Day1,
                    as_of: Some(as_of),
                    adjust: false,
                },
            )
            .into_iter()
            .next()
            .unwrap()
            .close
    };

    assert_eq!(at(t), dec!(100));
    assert_eq!(at(t + Duration::hours(1)), dec!(105));
}

/// S3 — resampling.
#[test]
fn s3_resampling() {
    let platform = DataPlatform::new();
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();

    let inputs: Vec<BarInput> = (0..30)
        .map(|i| {
            let ts = t0 + Duration::minutes(i);
            let close = Decimal::from(100 + i);
            BarInput {
                internal_id: None,
                ticker: Some("AAPL".into()),
                timestamp: ts,
                timeframe: Timeframe::Minute1,
                open: close,
                high: close,
                low: close,
                close,
                volume: dec!(100),
                timestamp_knowledge: Some(ts),
            }
        })
        .collect();
    platform.add_bars(inputs);

    let id = platform.get_internal_id("AAPL", t0);
    let bars = platform.get_bars(
        &[id],
        BarQuery {
            start: t0,
            end: t0 + Duration::minutes(29),
            timeframe: Timeframe::Minute30,
            as_of: None,
            adjust: false,
        },
    );

    assert_eq!(bars.len(), 1);
    let bar = &bars[0];
    assert_eq!(bar.volume, dec!(3000));
    assert_eq!(bar.close, dec!(129));
    assert_eq!(bar.open, dec!(100));
}

use chrono::TimeZone;

/// Universal invariant 2: with `adjust=false`, bars are identical to what
/// was written, and `adjust=true` with no corporate actions in the window
/// is identical to `adjust=false`.
#[test]
fn adjustment_identity_with_no_corporate_actions() {
    let platform = DataPlatform::new();
    let t1 = Utc::now();

    platform.add_bars(vec![day_bar(t1, dec!(42))]);
    let id = platform.get_internal_id("AAPL", t1);

    let query = |adjust: bool| {
        platform.get_bars(
            &[id],
            BarQuery {
                start: t1 - Duration::days(1),
                end: t1 + Duration::days(1),
                timeframe: Timeframe::Day1,
                as_of: None,
                adjust,
            },
        )
    };

    assert_eq!(query(false), query(true));
}
