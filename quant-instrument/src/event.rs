use crate::id::InternalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A discrete, non-bar observation attached to a security — earnings dates,
/// index membership changes, analyst rating changes, anything the alpha
/// engine wants to condition on besides price/volume.
///
/// Bitemporal like [`crate::Bar`]: `timestamp` is when the event occurred,
/// `timestamp_knowledge` is when it became known. `value` is deliberately
/// untyped (`serde_json::Value`) since `event_type` determines its shape and
/// the platform itself never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub internal_id: InternalId,
    pub timestamp: DateTime<Utc>,
    pub event_type: SmolStr,
    pub value: serde_json::Value,
    pub timestamp_knowledge: DateTime<Utc>,
}

impl Event {
    pub fn new(
        internal_id: InternalId,
        timestamp: DateTime<Utc>,
        event_type: impl Into<SmolStr>,
        value: serde_json::Value,
        timestamp_knowledge: DateTime<Utc>,
    ) -> Self {
        Self {
            internal_id,
            timestamp,
            event_type: event_type.into(),
            value,
            timestamp_knowledge,
        }
    }
}
