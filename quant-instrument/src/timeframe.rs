use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar aggregation period.
///
/// Ordered from finest to coarsest so that [`Timeframe::minutes`] is
/// monotonically increasing, which the Data Platform's on-read resampling
/// relies on when it looks for "the minimum timeframe" to aggregate from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Timeframe {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Day1,
}

impl Timeframe {
    /// All timeframes, finest to coarsest.
    pub const ALL: [Timeframe; 6] = [
        Timeframe::Minute1,
        Timeframe::Minute5,
        Timeframe::Minute15,
        Timeframe::Minute30,
        Timeframe::Hour1,
        Timeframe::Day1,
    ];

    /// Number of minutes this timeframe spans. Used for resampling math
    /// (bucketing a finer timeframe's timestamps into this one's windows).
    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::Minute1 => 1,
            Timeframe::Minute5 => 5,
            Timeframe::Minute15 => 15,
            Timeframe::Minute30 => 30,
            Timeframe::Hour1 => 60,
            Timeframe::Day1 => 1440,
        }
    }

    /// Whether this timeframe is finer than a full trading day.
    pub fn is_intraday(&self) -> bool {
        !matches!(self, Timeframe::Day1)
    }

    /// The finest (smallest) timeframe known to the platform, used as the
    /// source granularity for on-read aggregation.
    pub fn minimum() -> Timeframe {
        Timeframe::Minute1
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1min",
            Timeframe::Minute5 => "5min",
            Timeframe::Minute15 => "15min",
            Timeframe::Minute30 => "30min",
            Timeframe::Hour1 => "1hour",
            Timeframe::Day1 => "1D",
        };
        f.write_str(s)
    }
}
