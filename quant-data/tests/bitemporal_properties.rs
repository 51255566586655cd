use chrono::{Duration, Utc};
use proptest::prelude::*;
use quant_data::{BarInput, BarQuery, DataPlatform};
use quant_instrument::Timeframe;
use rust_decimal::Decimal;
use serde_json::Value;

proptest! {
    /// Universal invariant 1: bitemporal monotonicity. Writing restatements
    /// with strictly increasing knowledge-time offsets and querying with
    /// non-decreasing `as_of` values never observes a knowledge-time
    /// decrease.
    #[test]
    fn bitemporal_monotonicity(knowledge_offsets_hours in prop::collection::vec(1i64..48, 1..8)) {
        let platform = DataPlatform::new();
        let t = Utc::now();
        let id = platform.register_security("AAPL", t - Duration::days(1), t + Duration::days(365), Value::Null);

        let mut offsets: Vec<i64> = knowledge_offsets_hours;
        offsets.sort_unstable();
        offsets.dedup();

        for (i, &offset) in offsets.iter().enumerate() {
            platform.add_bars(vec![BarInput {
                internal_id: Some(id),
                ticker: None,
                timestamp: t,
                timeframe: Timeframe::Day1,
                open: Decimal::from(i as i64),
                high: Decimal::from(i as i64 + 1),
                low: Decimal::from(i as i64),
                close: Decimal::from(i as i64 + 1),
                volume: Decimal::from(100),
                timestamp_knowledge: Some(t + Duration::hours(offset)),
            }]);
        }

        let mut last_seen_knowledge: Option<chrono::DateTime<Utc>> = None;
        for &offset in &offsets {
            let as_of = t + Duration::hours(offset);
            let bars = platform.get_bars(
                &[id],
                BarQuery {
                    start: t - Duration::days(1),
                    end: t + Duration::days(1),
                    timeframe: Timeframe::Day1,
                    as_of: Some(as_of),
                    adjust: false,
                },
            );
            let knowledge = bars.first().map(|b| b.timestamp_knowledge);
            if let (Some(prev), Some(current)) = (last_seen_knowledge, knowledge) {
                prop_assert!(current >= prev);
            }
            last_seen_knowledge = knowledge;
        }
    }
}
