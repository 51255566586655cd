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

//! Portfolio Optimizer with Factor Risk: a PCA-based factor risk model, a
//! soft-penalty mean-variance optimizer and a portfolio-level safety rail,
//! wired together by [`PortfolioManager`].
//!
//! Failure is never surfaced as an `Err` here — a stale or absent risk
//! model, a non-converging solve, or a breached drawdown limit all resolve
//! to "keep the current weights" or "refuse to trade", matched by
//! [`PortfolioManager::optimize`] and [`PortfolioManager::check_safety`].

mod manager;
mod optimizer;
mod pca;
mod safety;

pub use manager::PortfolioManager;
pub use optimizer::{optimize, OptimizerParams};
pub use pca::{residual_returns, update_risk_model, RiskModelSnapshot};
pub use safety::SafetyRails;
