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

//! Feature & Alpha Engine: a dependency-ordered feature registry, scoped
//! model execution and signal combination on top of [`quant_data`].
//!
//! [`run`] is the entry point: fetch bars, [`hydrate`](hydrate::hydrate)
//! the requested features onto a [`Frame`], slice to a single timestamp,
//! then invoke an [`AlphaModel`] inside an [`AlphaContext`] scope.

mod context;
mod error;
mod features;
mod frame;
mod hydrate;
mod model;
mod registry;
mod signal;

pub use context::AlphaContext;
pub use error::AlphaError;
pub use features::register_defaults;
pub use frame::Frame;
pub use hydrate::hydrate;
pub use model::{run, AlphaModel, RunConfig};
pub use registry::{multi_tf_feature, register_feature, ComputeFn, FeatureDef};
pub use signal::{combine, winsorize, zscore};
