use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Unique identifier minted by the security master for a tradable identity.
///
/// `internal_id`s are allocated by [`crate::Security`]'s owner (the Data
/// Platform) starting at `1000`; this crate only carries the identifier
/// type, it does not allocate values.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Deserialize,
    Serialize,
    Constructor,
    Display,
)]
pub struct InternalId(pub u64);

impl InternalId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for InternalId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
