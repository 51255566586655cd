use crate::context::AlphaContext;
use crate::frame::Frame;
use crate::hydrate::hydrate;
use chrono::{DateTime, Duration, Utc};
use quant_data::{BarQuery, DataPlatform};
use quant_instrument::{InternalId, Timeframe};
use std::collections::HashMap;
use std::sync::Arc;

/// A quantitative model: declares the feature columns it needs hydrated,
/// then converts the hydrated cross-section at a single timestamp into
/// per-id forecasts.
pub trait AlphaModel: Send + Sync {
    fn requested_features(&self) -> Vec<String>;

    fn compute_signals(&self, latest: &HashMap<InternalId, HashMap<String, f64>>) -> HashMap<InternalId, f64>;
}

#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub timestamp: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub lookback_days: i64,
}

/// `run(platform, model, ids, config) -> map<id, f64>` (§4.B). Fetches
/// bars, hydrates the requested features, slices to `timestamp`, then
/// invokes `model.compute_signals` inside a scoped context — entered just
/// before the call and guaranteed to exit right after, on every path.
pub async fn run(
    platform: Arc<DataPlatform>,
    model: &dyn AlphaModel,
    ids: &[InternalId],
    config: RunConfig,
) -> HashMap<InternalId, f64> {
    let bars = platform.get_bars(
        ids,
        BarQuery {
            start: config.timestamp - Duration::days(config.lookback_days),
            end: config.timestamp,
            timeframe: config.timeframe,
            as_of: None,
            adjust: true,
        },
    );

    if bars.is_empty() {
        return HashMap::new();
    }

    let mut frame = Frame::from_bars(&bars, config.timeframe);
    hydrate(&mut frame, &model.requested_features());
    let latest = frame.slice_at(config.timestamp);

    AlphaContext::scope(platform, config.timestamp, || async move { model.compute_signals(&latest) }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use quant_data::BarInput;
    use rust_decimal_macros::dec;

    struct PassthroughModel;

    impl AlphaModel for PassthroughModel {
        fn requested_features(&self) -> Vec<String> {
            vec!["close_1D".to_string()]
        }

        fn compute_signals(&self, latest: &HashMap<InternalId, HashMap<String, f64>>) -> HashMap<InternalId, f64> {
            latest
                .iter()
                .map(|(&id, cols)| (id, *cols.get("close_1D").unwrap_or(&f64::NAN)))
                .collect()
        }
    }

    #[tokio::test]
    async fn test_run_empty_bars_yields_empty_signals() {
        let platform = Arc::new(DataPlatform::new());
        let model = PassthroughModel;
        let signals = run(
            Arc::clone(&platform),
            &model,
            &[InternalId(1000)],
            RunConfig {
                timestamp: Utc::now(),
                timeframe: Timeframe::Day1,
                lookback_days: 30,
            },
        )
        .await;
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn test_run_passes_close_through_to_model() {
        let platform = Arc::new(DataPlatform::new());
        let t = Utc::now();
        let id = platform.register_security("AAPL", t - Duration::days(1), t + Duration::days(1), serde_json::Value::Null);

        platform.add_bars(vec![BarInput {
            internal_id: Some(id),
            ticker: None,
            timestamp: t,
            timeframe: Timeframe::Day1,
            open: dec!(10),
            high: dec!(10),
            low: dec!(10),
            close: dec!(10),
            volume: dec!(100),
            timestamp_knowledge: Some(t),
        }]);

        let model = PassthroughModel;
        let signals = run(
            Arc::clone(&platform),
            &model,
            &[id],
            RunConfig {
                timestamp: t,
                timeframe: Timeframe::Day1,
                lookback_days: 30,
            },
        )
        .await;

        assert_eq!(signals.get(&id), Some(&10.0));
    }
}
