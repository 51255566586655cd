use crate::optimizer::{optimize, OptimizerParams};
use crate::pca::{residual_returns, update_risk_model, RiskModelSnapshot};
use crate::safety::SafetyRails;
use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use quant_instrument::InternalId;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Owns the live risk model snapshot and current portfolio weights (§4.C).
/// A single `PortfolioManager` is expected to live with one driver task —
/// `optimize` and `update_risk_model` are not re-entrant and the struct
/// does not attempt to provide its own synchronization.
#[derive(Debug)]
pub struct PortfolioManager {
    pub current_weights: HashMap<InternalId, f64>,
    risk_model: Option<RiskModelSnapshot>,
    ids_order: Vec<InternalId>,
    params: OptimizerParams,
    safety: SafetyRails,
}

impl PortfolioManager {
    pub fn new(params: OptimizerParams, max_drawdown: Decimal, max_messages_per_second: u32) -> Self {
        Self {
            current_weights: HashMap::new(),
            risk_model: None,
            ids_order: Vec::new(),
            params,
            safety: SafetyRails::new(max_drawdown, max_messages_per_second),
        }
    }

    /// Refit the factor risk model from a `T x N` returns matrix, `ids`
    /// giving the column ordering. Replaces any prior snapshot and its
    /// ordering wholesale.
    pub fn update_risk_model(&mut self, returns: &DMatrix<f64>, ids: &[InternalId], n_factors: usize) {
        debug!(assets = ids.len(), n_factors, "refitting factor risk model");
        self.risk_model = Some(update_risk_model(returns, n_factors));
        self.ids_order = ids.to_vec();
    }

    /// The idiosyncratic (factor-unexplained) component of `returns`,
    /// standardized against the current snapshot's fit. Returns `None` if
    /// no risk model has been fit yet.
    pub fn residual_returns(&self, returns: &DMatrix<f64>) -> Option<DMatrix<f64>> {
        self.risk_model.as_ref().map(|snapshot| residual_returns(returns, snapshot))
    }

    pub fn risk_model(&self) -> Option<&RiskModelSnapshot> {
        self.risk_model.as_ref()
    }

    /// Soft-penalty QP rebalance against `forecasts`, optionally tilted by
    /// `factor_returns` (one entry per factor column of the fitted
    /// `loadings`) per §4.C's `μ + B·factor_returns` adjustment. Falls back
    /// to the current weights unchanged if no risk model is fit yet, or if
    /// the fitted model's asset ordering disagrees with `forecasts` — see
    /// [`optimize`] for the full fallback policy.
    pub fn optimize(
        &mut self,
        forecasts: &HashMap<InternalId, f64>,
        factor_returns: Option<&[f64]>,
    ) -> HashMap<InternalId, f64> {
        let Some(snapshot) = &self.risk_model else {
            return self.current_weights.clone();
        };
        let new_weights = optimize(
            forecasts,
            &self.current_weights,
            &snapshot.sigma,
            &snapshot.loadings,
            factor_returns,
            &self.ids_order,
            &self.params,
        );
        self.current_weights = new_weights.clone();
        new_weights
    }

    /// Drawdown kill-switch plus message-rate limiter. See
    /// [`SafetyRails::check_safety`].
    pub fn check_safety(&mut self, equity: Decimal, now: DateTime<Utc>) -> bool {
        self.safety.check_safety(equity, now)
    }

    pub fn is_killed(&self) -> bool {
        self.safety.is_killed()
    }
}
