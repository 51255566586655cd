use crate::id::InternalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A tradable identity, exclusively owned and allocated by the Data
/// Platform's security master.
///
/// For a given `ticker`, the `[start, end)` coverage intervals of distinct
/// `internal_id`s must never overlap (enforced by the Data Platform, not by
/// this type) — a ticker reuse (e.g. "FB" -> "META") is represented as two
/// [`Security`] rows with disjoint intervals and distinct ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub internal_id: InternalId,
    pub ticker: SmolStr,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub extra: serde_json::Value,
}

impl Security {
    pub fn new(
        internal_id: InternalId,
        ticker: impl Into<SmolStr>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        extra: serde_json::Value,
    ) -> Self {
        Self {
            internal_id,
            ticker: ticker.into(),
            start,
            end,
            extra,
        }
    }

    /// Whether `date` falls within this [`Security`]'s coverage interval.
    pub fn covers(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether this [`Security`]'s coverage interval overlaps `other`'s.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= end && self.end >= start
    }
}
