#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    rust_2018_idioms
)]

//! Execution Scheduler: slices parent orders into time-spaced child
//! orders, fires them from a single background worker against a
//! [`Broker`], and supports cancellation and goal-position rebalancing.
//!
//! [`Scheduler`] is the entry point: construct it over a `Broker`
//! implementation, [`Scheduler::spawn`] its worker, then drive it with
//! [`Scheduler::vwap_execute`], [`Scheduler::cancel_order`] and
//! [`Scheduler::rebalance`].

mod broker;
mod scheduler;
mod tca;

pub use broker::Broker;
pub use scheduler::Scheduler;
pub use tca::slippage;
