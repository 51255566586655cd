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

//! Low-level numeric primitives shared across the quant workspace: the
//! mean/stdev arithmetic in [`numeric`] used by both `quant-alpha` and
//! `quant-risk`.

pub mod numeric;
