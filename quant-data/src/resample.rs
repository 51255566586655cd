use quant_instrument::{Bar, Timeframe};
use std::collections::BTreeMap;

/// Floors `timestamp` to the start of its `timeframe` bucket, anchored at
/// the Unix epoch so bucket edges are stable across calls.
fn floor_to_timeframe(
    timestamp: chrono::DateTime<chrono::Utc>,
    timeframe: Timeframe,
) -> chrono::DateTime<chrono::Utc> {
    let minutes_since_epoch = timestamp.timestamp().div_euclid(60);
    let step = timeframe.minutes();
    let bucket_minutes = minutes_since_epoch.div_euclid(step) * step;
    chrono::DateTime::from_timestamp(bucket_minutes * 60, 0).expect("bucket timestamp in range")
}

/// Aggregates finer-grained `bars` (assumed to already be PIT-deduped) up
/// into `target`: `open` = first, `high` = max, `low` = min, `close` =
/// last, `volume` = sum, grouped by `(internal_id, floor(timestamp))`.
///
/// `timestamp_knowledge` of an aggregated bar is the latest knowledge-time
/// among its constituents — the aggregate only becomes knowable once every
/// bar composing it is.
pub fn aggregate(bars: &[Bar], target: Timeframe) -> Vec<Bar> {
    let mut buckets: BTreeMap<(quant_instrument::InternalId, chrono::DateTime<chrono::Utc>), Vec<&Bar>> =
        BTreeMap::new();

    for bar in bars {
        let bucket = floor_to_timeframe(bar.timestamp, target);
        buckets.entry((bar.internal_id, bucket)).or_default().push(bar);
    }

    buckets
        .into_iter()
        .map(|((internal_id, bucket), mut group)| {
            group.sort_by_key(|b| b.timestamp);
            let open = group.first().expect("non-empty group").open;
            let close = group.last().expect("non-empty group").close;
            let high = group.iter().map(|b| b.high).max().expect("non-empty group");
            let low = group.iter().map(|b| b.low).min().expect("non-empty group");
            let volume = group.iter().map(|b| b.volume).sum();
            let timestamp_knowledge = group
                .iter()
                .map(|b| b.timestamp_knowledge)
                .max()
                .expect("non-empty group");

            Bar {
                internal_id,
                timestamp: bucket,
                timeframe: target,
                open,
                high,
                low,
                close,
                volume,
                timestamp_knowledge,
            }
        })
        .collect()
}
