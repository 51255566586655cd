use nalgebra::{DMatrix, DVector};

/// `{ sigma: NxN PSD, loadings: NxK }`, rebuilt on demand from a returns
/// history matrix (§3 "Risk model snapshot"). `means`/`stdevs` are the
/// per-asset standardization parameters the model was fit against, kept
/// so residual returns of new data standardize consistently with the fit.
#[derive(Debug, Clone)]
pub struct RiskModelSnapshot {
    pub sigma: DMatrix<f64>,
    pub loadings: DMatrix<f64>,
    pub means: Vec<f64>,
    pub stdevs: Vec<f64>,
}

impl RiskModelSnapshot {
    pub fn n_assets(&self) -> usize {
        self.sigma.nrows()
    }
}

/// Column-wise z-score standardization. A column with zero variance is
/// nudged to a tiny floor rather than dividing by zero — the original
/// fit injects negligible noise for the same reason.
fn standardize(returns: &DMatrix<f64>) -> (DMatrix<f64>, Vec<f64>, Vec<f64>) {
    let (t, n) = returns.shape();
    let mut means = vec![0.0; n];
    let mut stdevs = vec![0.0; n];
    let mut z = DMatrix::zeros(t, n);

    for j in 0..n {
        let values: Vec<f64> = returns.column(j).iter().copied().collect();
        let (mean, std) = quant_integration::numeric::mean_std(&values);
        let std = if std == 0.0 { 1e-8 } else { std };
        means[j] = mean;
        stdevs[j] = std;
        for i in 0..t {
            z[(i, j)] = (returns[(i, j)] - mean) / std;
        }
    }

    (z, means, stdevs)
}

fn standardize_with(returns: &DMatrix<f64>, means: &[f64], stdevs: &[f64]) -> DMatrix<f64> {
    let (t, n) = returns.shape();
    let mut z = DMatrix::zeros(t, n);
    for j in 0..n {
        for i in 0..t {
            z[(i, j)] = (returns[(i, j)] - means[j]) / stdevs[j];
        }
    }
    z
}

/// `update_risk_model(returns)` (§4.C): standardize, SVD/PCA with
/// `k = min(n_factors, T, N)`, reconstruct standardized covariance from
/// the top-k loadings plus a floored specific-variance diagonal, then undo
/// standardization.
pub fn update_risk_model(returns: &DMatrix<f64>, n_factors: usize) -> RiskModelSnapshot {
    let (t, n) = returns.shape();
    let (z, means, stdevs) = standardize(returns);
    let k = n_factors.min(t).min(n).max(1);

    let svd = z.svd(false, true);
    let v_t = svd.v_t.expect("svd computed with compute_v=true");
    let v = v_t.transpose();
    let loadings = v.columns(0, k).into_owned();

    let denom = (t as f64 - 1.0).max(1.0);
    let eigenvalues: Vec<f64> = (0..k)
        .map(|i| {
            let s = svd.singular_values.get(i).copied().unwrap_or(0.0);
            let variance = (s * s) / denom;
            // a non-converging SVD on pathological input can yield a NaN
            // singular value; floor it to zero rather than poisoning sigma.
            if quant_integration::numeric::is_non_finite(variance) {
                0.0
            } else {
                variance
            }
        })
        .collect();
    let lambda = DMatrix::from_diagonal(&DVector::from_vec(eigenvalues));

    let f = &loadings * &lambda * loadings.transpose();

    let mut sigma_z = f.clone();
    for i in 0..n {
        let specific = (1.0 - f[(i, i)]).max(0.0);
        sigma_z[(i, i)] += specific;
    }

    let mut sigma = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            sigma[(i, j)] = sigma_z[(i, j)] * stdevs[i] * stdevs[j];
        }
    }

    RiskModelSnapshot { sigma, loadings, means, stdevs }
}

/// `get_residual_returns(returns, k)`: `(Z - Z_explained) * sigma`, where
/// `Z_explained` is the PCA reconstruction from the snapshot's loadings —
/// the portion of each standardized return the factor model does not
/// explain, consumed downstream as idiosyncratic alpha.
pub fn residual_returns(returns: &DMatrix<f64>, snapshot: &RiskModelSnapshot) -> DMatrix<f64> {
    let (t, n) = returns.shape();
    let z = standardize_with(returns, &snapshot.means, &snapshot.stdevs);
    let explained = &z * &snapshot.loadings * snapshot.loadings.transpose();
    let residual_z = &z - &explained;

    let mut out = DMatrix::zeros(t, n);
    for j in 0..n {
        for i in 0..t {
            out[(i, j)] = residual_z[(i, j)] * snapshot.stdevs[j];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_risk_model_sigma_is_symmetric() {
        let returns = DMatrix::from_row_slice(
            6,
            2,
            &[
                0.01, 0.02, -0.01, -0.02, 0.02, 0.01, -0.02, -0.01, 0.015, 0.018, -0.017, -0.019,
            ],
        );
        let snapshot = update_risk_model(&returns, 1);
        assert_eq!(snapshot.n_assets(), 2);
        for i in 0..2 {
            for j in 0..2 {
                assert!((snapshot.sigma[(i, j)] - snapshot.sigma[(j, i)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_residual_returns_shape_matches_input() {
        let returns = DMatrix::from_row_slice(
            6,
            2,
            &[
                0.01, 0.02, -0.01, -0.02, 0.02, 0.01, -0.02, -0.01, 0.015, 0.018, -0.017, -0.019,
            ],
        );
        let snapshot = update_risk_model(&returns, 1);
        let residual = residual_returns(&returns, &snapshot);
        assert_eq!(residual.shape(), returns.shape());
    }
}
