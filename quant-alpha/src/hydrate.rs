use crate::frame::Frame;
use crate::registry;
use std::collections::HashSet;
use tracing::debug;

/// Recursive, memoized depth-first hydration (§4.B): for each requested
/// name, visits dependencies before computing. Unknown names — either a
/// base bar column already present in the frame, or a name nobody ever
/// registered — are skipped silently, never an error. `visited` guarantees
/// no compute is invoked twice per frame (§8 invariant 3), even across
/// overlapping dependency chains.
pub fn hydrate(frame: &mut Frame, names: &[String]) {
    let mut visited = HashSet::new();
    for name in names {
        hydrate_one(frame, name, &mut visited);
    }
}

fn hydrate_one(frame: &mut Frame, name: &str, visited: &mut HashSet<String>) {
    if visited.contains(name) {
        return;
    }
    visited.insert(name.to_string());

    if frame.has_column(name) {
        return;
    }

    let Some(def) = registry::lookup(name) else {
        debug!(feature = name, "unknown feature name, skipping");
        return;
    };

    for dep in &def.deps {
        hydrate_one(frame, dep, visited);
    }

    let values = (def.compute)(frame);
    frame.set_column(def.name, values);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::register_feature;
    use chrono::Utc;
    use quant_instrument::{InternalId, Timeframe};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_hydrate_runs_deps_before_dependent_and_once_each() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        register_feature(
            "hydrate_test_dep",
            vec!["close_1D".to_string()],
            Arc::new(|frame| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                frame
                    .series("close_1D")
                    .into_iter()
                    .flat_map(|(id, series)| series.into_iter().map(move |(ts, v)| ((id, ts), v * 2.0)))
                    .collect()
            }),
        );
        register_feature(
            "hydrate_test_dependent",
            vec!["hydrate_test_dep".to_string()],
            Arc::new(|frame| {
                frame
                    .series("hydrate_test_dep")
                    .into_iter()
                    .flat_map(|(id, series)| series.into_iter().map(move |(ts, v)| ((id, ts), v + 1.0)))
                    .collect()
            }),
        );

        let t = Utc::now();
        let bar = quant_instrument::Bar {
            internal_id: InternalId(1000),
            timestamp: t,
            timeframe: Timeframe::Day1,
            open: dec!(10),
            high: dec!(10),
            low: dec!(10),
            close: dec!(10),
            volume: dec!(100),
            timestamp_knowledge: t,
        };
        let mut frame = Frame::from_bars(&[bar], Timeframe::Day1);

        let before = CALLS.load(Ordering::SeqCst);
        hydrate(
            &mut frame,
            &[
                "hydrate_test_dependent".to_string(),
                "hydrate_test_dependent".to_string(),
            ],
        );

        assert!(frame.has_column("hydrate_test_dep"));
        assert!(frame.has_column("hydrate_test_dependent"));
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_unknown_feature_name_is_skipped() {
        let t = Utc::now();
        let bar = quant_instrument::Bar {
            internal_id: InternalId(1000),
            timestamp: t,
            timeframe: Timeframe::Day1,
            open: dec!(10),
            high: dec!(10),
            low: dec!(10),
            close: dec!(10),
            volume: dec!(100),
            timestamp_knowledge: t,
        };
        let mut frame = Frame::from_bars(&[bar], Timeframe::Day1);
        hydrate(&mut frame, &["totally_unregistered_feature".to_string()]);
        assert!(!frame.has_column("totally_unregistered_feature"));
    }
}
