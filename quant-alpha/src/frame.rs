use chrono::{DateTime, Utc};
use quant_instrument::{Bar, InternalId, Timeframe};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;

/// A cross-sectional history frame: named columns of `f64`, each keyed by
/// `(internal_id, timestamp)`. Seeded from [`crate::run`]'s bar fetch with
/// the OHLCV base columns suffixed `_<timeframe>` (§4.A's column renaming,
/// consumed here rather than inside the Data Platform), then grown in
/// place by feature hydration.
#[derive(Debug, Default, Clone)]
pub struct Frame {
    index: Vec<(InternalId, DateTime<Utc>)>,
    columns: HashMap<String, HashMap<(InternalId, DateTime<Utc>), f64>>,
}

impl Frame {
    pub fn from_bars(bars: &[Bar], timeframe: Timeframe) -> Self {
        let mut open = HashMap::new();
        let mut high = HashMap::new();
        let mut low = HashMap::new();
        let mut close = HashMap::new();
        let mut volume = HashMap::new();
        let mut index = Vec::with_capacity(bars.len());

        for bar in bars {
            let key = (bar.internal_id, bar.timestamp);
            index.push(key);
            open.insert(key, bar.open.to_f64().unwrap_or(f64::NAN));
            high.insert(key, bar.high.to_f64().unwrap_or(f64::NAN));
            low.insert(key, bar.low.to_f64().unwrap_or(f64::NAN));
            close.insert(key, bar.close.to_f64().unwrap_or(f64::NAN));
            volume.insert(key, bar.volume.to_f64().unwrap_or(f64::NAN));
        }

        let mut columns = HashMap::new();
        columns.insert(format!("open_{timeframe}"), open);
        columns.insert(format!("high_{timeframe}"), high);
        columns.insert(format!("low_{timeframe}"), low);
        columns.insert(format!("close_{timeframe}"), close);
        columns.insert(format!("volume_{timeframe}"), volume);

        Self { index, columns }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn set_column(&mut self, name: impl Into<String>, values: HashMap<(InternalId, DateTime<Utc>), f64>) {
        self.columns.insert(name.into(), values);
    }

    pub fn index(&self) -> &[(InternalId, DateTime<Utc>)] {
        &self.index
    }

    /// Every `(timestamp, value)` pair present for `column` and `id`,
    /// sorted ascending by timestamp — the shape rolling-window features
    /// (SMA, EMA, RSI) need.
    pub fn series(&self, column: &str) -> HashMap<InternalId, Vec<(DateTime<Utc>, f64)>> {
        let mut out: HashMap<InternalId, Vec<(DateTime<Utc>, f64)>> = HashMap::new();
        if let Some(values) = self.columns.get(column) {
            for (&(id, ts), &v) in values {
                out.entry(id).or_default().push((ts, v));
            }
        }
        for series in out.values_mut() {
            series.sort_by(|a, b| a.0.cmp(&b.0));
        }
        out
    }

    /// Slices the frame to the row group at `timestamp`, keyed by
    /// `internal_id` (§4.B `run`, step 3).
    pub fn slice_at(&self, timestamp: DateTime<Utc>) -> HashMap<InternalId, HashMap<String, f64>> {
        let mut out: HashMap<InternalId, HashMap<String, f64>> = HashMap::new();
        for (column, values) in &self.columns {
            for (&(id, ts), &v) in values {
                if ts == timestamp {
                    out.entry(id).or_default().insert(column.clone(), v);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(id: InternalId, ts: DateTime<Utc>, close: rust_decimal::Decimal) -> Bar {
        Bar {
            internal_id: id,
            timestamp: ts,
            timeframe: Timeframe::Day1,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1000),
            timestamp_knowledge: ts,
        }
    }

    #[test]
    fn test_from_bars_seeds_suffixed_columns() {
        let t = Utc::now();
        let frame = Frame::from_bars(&[bar(InternalId(1000), t, dec!(10))], Timeframe::Day1);
        assert!(frame.has_column("close_1D"));
        assert!(!frame.has_column("close_30min"));
    }

    #[test]
    fn test_series_sorted_ascending() {
        let t0 = Utc::now();
        let bars = vec![
            bar(InternalId(1000), t0 + chrono::Duration::days(1), dec!(20)),
            bar(InternalId(1000), t0, dec!(10)),
        ];
        let frame = Frame::from_bars(&bars, Timeframe::Day1);
        let series = frame.series("close_1D");
        let values: Vec<f64> = series[&InternalId(1000)].iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10.0, 20.0]);
    }
}
