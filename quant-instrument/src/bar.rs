use crate::{id::InternalId, timeframe::Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV observation, bitemporal: `timestamp` is event time, the
/// time the bar's window occurred; `timestamp_knowledge` is when the bar
/// became known to the system (arrival or restatement).
///
/// Multiple [`Bar`]s can share `(internal_id, timeframe, timestamp)` with
/// different `timestamp_knowledge` — each later one is a restatement, not a
/// conflicting write. The Data Platform projects the bitemporal history
/// down to "latest knowledge per event-time" on read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub internal_id: InternalId,
    pub timestamp: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub timestamp_knowledge: DateTime<Utc>,
}

impl Bar {
    /// Validation the Data Platform applies at write; bars that fail this
    /// are dropped silently, never surfaced as an error (§3/§7).
    pub fn is_valid(&self) -> bool {
        let high_ok = self.high >= self.open.max(self.close).max(self.low);
        let low_ok = self.low <= self.open.min(self.close).min(self.high);
        high_ok && low_ok && self.volume >= Decimal::ZERO && self.close > Decimal::ZERO
    }
}
