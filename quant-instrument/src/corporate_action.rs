use crate::id::InternalId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two corporate action kinds the Data Platform adjusts bars for.
///
/// `Split.value` is the split ratio (e.g. `2` for a 2-for-1 split);
/// `Dividend.value` is the cash amount paid per share.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorporateActionKind {
    Split,
    Dividend,
}

/// A single corporate action effective as of `ex_date`.
///
/// Not bitemporal — corporate actions are applied as of their `ex_date` with
/// no knowledge-time axis, since restating a historical split/dividend is
/// treated as correcting the row in place rather than layering a new fact on
/// top (unlike [`crate::Bar`]/[`crate::Event`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateAction {
    pub internal_id: InternalId,
    pub ex_date: DateTime<Utc>,
    pub kind: CorporateActionKind,
    pub value: Decimal,
}

impl CorporateAction {
    pub fn new(
        internal_id: InternalId,
        ex_date: DateTime<Utc>,
        kind: CorporateActionKind,
        value: Decimal,
    ) -> Self {
        Self {
            internal_id,
            ex_date,
            kind,
            value,
        }
    }
}
