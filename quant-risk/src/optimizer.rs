use nalgebra::DMatrix;
use quant_instrument::InternalId;
use std::collections::HashMap;

/// Soft-penalty QP tuning knobs (§4.C "optimize"). Defaults mirror the
/// relative weights the original portfolio manager ships with: a modest
/// risk aversion, light transaction-cost/impact drag, and penalty terms
/// steep enough that net/gross/position caps bind in practice rather than
/// in theory only.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerParams {
    pub risk_aversion: f64,
    pub tc_penalty: f64,
    pub impact_coef: f64,
    pub leverage_limit: f64,
    pub max_position: f64,
    pub lambda_net: f64,
    pub lambda_gross: f64,
    pub lambda_pos: f64,
    pub step_size: f64,
    pub max_iters: usize,
    pub tolerance: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            risk_aversion: 1.0,
            tc_penalty: 0.001,
            impact_coef: 0.0005,
            leverage_limit: 1.0,
            max_position: 0.2,
            lambda_net: 100.0,
            lambda_gross: 50.0,
            lambda_pos: 10.0,
            step_size: 0.05,
            max_iters: 500,
            tolerance: 1e-8,
        }
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Gradient of the soft-penalty objective w.r.t. `w`, at fixed `sigma_w = Σw`.
///
/// `wᵀμ − ½λ·wᵀΣw − c₁‖w−w_prev‖₁ − c₂Σ|w−w_prev|^1.5 − λ_net(Σw)² −
/// λ_gross·max(0,‖w‖₁−L)² − λ_pos·Σmax(0,|wᵢ|−P)²`
fn gradient(
    w: &DMatrix<f64>,
    w_prev: &DMatrix<f64>,
    mu: &DMatrix<f64>,
    sigma: &DMatrix<f64>,
    params: &OptimizerParams,
) -> DMatrix<f64> {
    let n = w.nrows();
    let sigma_w = sigma * w;
    let net = w.sum();
    let gross = w.iter().map(|v| v.abs()).sum::<f64>();
    let gross_excess = (gross - params.leverage_limit).max(0.0);

    let mut grad = DMatrix::zeros(n, 1);
    for i in 0..n {
        let diff = w[(i, 0)] - w_prev[(i, 0)];
        let tc = params.tc_penalty * sign(diff);
        let impact = params.impact_coef * 1.5 * diff.abs().sqrt() * sign(diff);
        let net_term = 2.0 * params.lambda_net * net;
        let gross_term = 2.0 * params.lambda_gross * gross_excess * sign(w[(i, 0)]);
        let pos_excess = (w[(i, 0)].abs() - params.max_position).max(0.0);
        let pos_term = 2.0 * params.lambda_pos * pos_excess * sign(w[(i, 0)]);

        grad[(i, 0)] = mu[(i, 0)] - params.risk_aversion * sigma_w[(i, 0)] - tc - impact
            - net_term
            - gross_term
            - pos_term;
    }
    grad
}

/// Projected/subgradient gradient ascent on the soft-penalty objective,
/// starting from `w_prev`. Runs to `max_iters` or until the update shrinks
/// below `tolerance`. Returns `None` (a `SolverFailure`, §7) if any
/// intermediate weight vector goes non-finite — the caller is expected to
/// fall back to `w_prev` unchanged.
fn ascend(
    w_prev: &DMatrix<f64>,
    mu: &DMatrix<f64>,
    sigma: &DMatrix<f64>,
    params: &OptimizerParams,
) -> Option<DMatrix<f64>> {
    let mut w = w_prev.clone();
    for _ in 0..params.max_iters {
        let grad = gradient(&w, w_prev, mu, sigma, params);
        let step = &grad * params.step_size;
        let next = &w + &step;

        if next.iter().any(|&v| quant_integration::numeric::is_non_finite(v)) {
            return None;
        }

        let delta = (&next - &w).iter().map(|v| v * v).sum::<f64>().sqrt();
        w = next;
        if delta < params.tolerance {
            break;
        }
    }

    if w.iter().any(|&v| quant_integration::numeric::is_non_finite(v)) {
        None
    } else {
        Some(w)
    }
}

/// `optimize(forecasts, current_weights, sigma, loadings, factor_returns,
/// ids_order, params)` (§4.C). `ids_order` fixes the column ordering `sigma` and
/// `loadings` were fit against; forecasts for ids outside that ordering are
/// ignored and ids in the ordering with no forecast default to zero
/// expected return.
///
/// When `factor_returns` is supplied (one entry per factor column of
/// `loadings`), `μ` is tilted to `μ + loadings·factor_returns` before the
/// objective is built — spec.md §4.C's "optionally adjusted to
/// `μ + B·factor_returns` if a factor-returns vector is supplied". A
/// length mismatch against `loadings`' column count is treated the same as
/// `None`: no tilt is applied.
///
/// Falls back to `current_weights` unchanged (never an `Err`) when
/// forecasts are empty, the ordering is empty, or the solver produces a
/// non-finite result.
pub fn optimize(
    forecasts: &HashMap<InternalId, f64>,
    current_weights: &HashMap<InternalId, f64>,
    sigma: &DMatrix<f64>,
    loadings: &DMatrix<f64>,
    factor_returns: Option<&[f64]>,
    ids_order: &[InternalId],
    params: &OptimizerParams,
) -> HashMap<InternalId, f64> {
    if forecasts.is_empty() || ids_order.is_empty() || sigma.nrows() != ids_order.len() {
        return current_weights.clone();
    }

    let n = ids_order.len();
    let mut mu = DMatrix::from_fn(n, 1, |i, _| forecasts.get(&ids_order[i]).copied().unwrap_or(0.0));

    if let Some(factor_returns) = factor_returns {
        if loadings.nrows() == n && loadings.ncols() == factor_returns.len() {
            let f = DMatrix::from_column_slice(factor_returns.len(), 1, factor_returns);
            mu += loadings * f;
        }
    }

    let w_prev =
        DMatrix::from_fn(n, 1, |i, _| current_weights.get(&ids_order[i]).copied().unwrap_or(0.0));

    match ascend(&w_prev, &mu, sigma, params) {
        Some(w) => ids_order.iter().enumerate().map(|(i, &id)| (id, w[(i, 0)])).collect(),
        None => current_weights.clone(),
    }
}
