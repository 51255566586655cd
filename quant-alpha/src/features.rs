//! A small default feature library: simple/exponential moving averages,
//! single-period returns, RSI and MACD, each registered per timeframe via
//! [`crate::registry::multi_tf_feature`]. Grounded in the moving-average
//! style of a systems-language indicator library (sliding-window SMA,
//! multiplier-based EMA) and in the RSI/MACD formulas used by this
//! problem domain's feature store (Wilder's RSI smoothing window, 12/26
//! EMA MACD).
//!
//! Registration is opt-in: call [`register_defaults`] once at process
//! start before any model run, per the registry's "populated before any
//! run, never mutated thereafter" contract.

use crate::registry::{multi_tf_feature, ComputeFn};
use quant_instrument::Timeframe;
use std::collections::HashMap;
use std::sync::Arc;

fn sma_compute(window: usize, source: String) -> ComputeFn {
    Arc::new(move |frame| {
        let mut out = HashMap::new();
        for (id, series) in frame.series(&source) {
            for i in 0..series.len() {
                let (ts, _) = series[i];
                let value = if i + 1 >= window {
                    series[i + 1 - window..=i].iter().map(|(_, v)| v).sum::<f64>() / window as f64
                } else {
                    f64::NAN
                };
                out.insert((id, ts), value);
            }
        }
        out
    })
}

fn ema_compute(window: usize, source: String) -> ComputeFn {
    let alpha = 2.0 / (window as f64 + 1.0);
    Arc::new(move |frame| {
        let mut out = HashMap::new();
        for (id, series) in frame.series(&source) {
            let mut prev: Option<f64> = None;
            for (ts, v) in series {
                let ema = match prev {
                    None => v,
                    Some(p) => alpha * v + (1.0 - alpha) * p,
                };
                out.insert((id, ts), ema);
                prev = Some(ema);
            }
        }
        out
    })
}

fn return_1_compute(source: String) -> ComputeFn {
    Arc::new(move |frame| {
        let mut out = HashMap::new();
        for (id, series) in frame.series(&source) {
            for i in 0..series.len() {
                let (ts, v) = series[i];
                let value = if i == 0 || series[i - 1].1 == 0.0 {
                    f64::NAN
                } else {
                    v / series[i - 1].1 - 1.0
                };
                out.insert((id, ts), value);
            }
        }
        out
    })
}

/// Wilder's RSI over `period` bars: average gain / average loss over a
/// trailing window of deltas, `100 - 100/(1+rs)`.
fn rsi_compute(period: usize, source: String) -> ComputeFn {
    Arc::new(move |frame| {
        let mut out = HashMap::new();
        for (id, series) in frame.series(&source) {
            let deltas: Vec<f64> = series.windows(2).map(|w| w[1].1 - w[0].1).collect();
            for i in 0..series.len() {
                let (ts, _) = series[i];
                let value = if i < period {
                    f64::NAN
                } else {
                    let window = &deltas[i - period..i];
                    let gain = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
                    let loss = -window.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;
                    if loss == 0.0 {
                        100.0
                    } else {
                        let rs = gain / loss;
                        100.0 - 100.0 / (1.0 + rs)
                    }
                };
                out.insert((id, ts), value);
            }
        }
        out
    })
}

/// 12/26-period EMA difference.
fn macd_compute(source: String) -> ComputeFn {
    Arc::new(move |frame| {
        let mut out = HashMap::new();
        let fast_alpha = 2.0 / 13.0;
        let slow_alpha = 2.0 / 27.0;
        for (id, series) in frame.series(&source) {
            let mut fast_prev: Option<f64> = None;
            let mut slow_prev: Option<f64> = None;
            for (ts, v) in series {
                let fast = match fast_prev {
                    None => v,
                    Some(p) => fast_alpha * v + (1.0 - fast_alpha) * p,
                };
                let slow = match slow_prev {
                    None => v,
                    Some(p) => slow_alpha * v + (1.0 - slow_alpha) * p,
                };
                out.insert((id, ts), fast - slow);
                fast_prev = Some(fast);
                slow_prev = Some(slow);
            }
        }
        out
    })
}

/// Registers the default feature library across `timeframes`. Idempotent
/// to call more than once (later registrations simply overwrite earlier
/// ones with identical definitions), but callers should only need to call
/// it once, before the first model run.
pub fn register_defaults(timeframes: &[Timeframe]) {
    multi_tf_feature("sma10", timeframes, &["close"], |tf| sma_compute(10, format!("close_{tf}")));
    multi_tf_feature("sma20", timeframes, &["close"], |tf| sma_compute(20, format!("close_{tf}")));
    multi_tf_feature("ema12", timeframes, &["close"], |tf| ema_compute(12, format!("close_{tf}")));
    multi_tf_feature("ema26", timeframes, &["close"], |tf| ema_compute(26, format!("close_{tf}")));
    multi_tf_feature("return_1", timeframes, &["close"], |tf| return_1_compute(format!("close_{tf}")));
    multi_tf_feature("rsi14", timeframes, &["close"], |tf| rsi_compute(14, format!("close_{tf}")));
    multi_tf_feature("macd", timeframes, &["close"], |tf| macd_compute(format!("close_{tf}")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::hydrate::hydrate;
    use chrono::{Duration, Utc};
    use quant_instrument::{Bar, InternalId};
    use rust_decimal::Decimal;

    fn daily_bars(id: InternalId, closes: &[i64]) -> Vec<Bar> {
        let t0 = Utc::now();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = t0 + Duration::days(i as i64);
                let close = Decimal::from(c);
                Bar {
                    internal_id: id,
                    timestamp: ts,
                    timeframe: Timeframe::Day1,
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: Decimal::from(1000),
                    timestamp_knowledge: ts,
                }
            })
            .collect()
    }

    #[test]
    fn test_sma10_matches_manual_average_at_window_edge() {
        register_defaults(&[Timeframe::Day1]);
        let id = InternalId(9001);
        let closes: Vec<i64> = (1..=10).collect();
        let bars = daily_bars(id, &closes);
        let mut frame = Frame::from_bars(&bars, Timeframe::Day1);
        hydrate(&mut frame, &["sma10_1D".to_string()]);

        let series = frame.series("sma10_1D");
        let last = series[&id].last().unwrap().1;
        assert!((last - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_return_1_first_bar_is_nan() {
        register_defaults(&[Timeframe::Day1]);
        let id = InternalId(9002);
        let bars = daily_bars(id, &[100, 110]);
        let mut frame = Frame::from_bars(&bars, Timeframe::Day1);
        hydrate(&mut frame, &["return_1_1D".to_string()]);

        let series = frame.series("return_1_1D");
        assert!(series[&id][0].1.is_nan());
        assert!((series[&id][1].1 - 0.1).abs() < 1e-9);
    }
}
