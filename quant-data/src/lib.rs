#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Bitemporal Data Platform: point-in-time correct storage and retrieval of
//! bars, events, corporate actions and security identities, with on-read
//! resampling and split/dividend adjustment.
//!
//! [`DataPlatform`] is the single entry point; [`provider`] defines the
//! traits an external vendor feed implements to populate it.

mod adjust;
mod platform;
mod provider;
mod resample;

pub use platform::{BarInput, BarQuery, DataPlatform, EventInput};
pub use provider::{BarRow, CorporateActionRow, DataProvider, EventRow, StreamingProvider};
