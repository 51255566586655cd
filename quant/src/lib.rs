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

//! Systematic trading core: wires the Bitemporal Data Platform
//! (`quant-data`), the Feature & Alpha Engine (`quant-alpha`), the
//! Portfolio Optimizer with Factor Risk (`quant-risk`) and the Execution
//! Scheduler (`quant-execution`) into the single trading-cycle pipeline
//! `spec.md` §2 describes.
//!
//! This crate has no CLI or driver of its own — it is a facade a backtest
//! harness or a live driver embeds; see [`Cycle`].

mod cycle;

pub use cycle::{Cycle, WeightedModel};

pub use quant_alpha::{AlphaModel, RunConfig};
pub use quant_data::DataPlatform;
pub use quant_execution::{Broker, Scheduler};
pub use quant_instrument::{InternalId, Order, OrderSide, OrderState, Timeframe};
pub use quant_risk::{OptimizerParams, PortfolioManager};
