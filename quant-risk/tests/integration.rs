use chrono::Utc;
use nalgebra::DMatrix;
use quant_instrument::InternalId;
use quant_risk::{OptimizerParams, PortfolioManager};
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// S7: two assets loaded [[+1],[-1]] onto a single factor, zero
/// idiosyncratic forecasts, a positive factor return supplied through
/// `optimize`'s `factor_returns` parameter. The optimizer should tilt
/// `mu = loadings * factor_returns` and take opposite-signed positions on
/// the two assets, not just scale a pre-tilted forecast map.
#[test]
fn s7_factor_loadings_drive_opposite_signed_weights() {
    let mut manager = PortfolioManager::new(OptimizerParams::default(), dec!(-0.1), 1000);
    let ids = vec![InternalId(1), InternalId(2)];

    let returns = DMatrix::from_row_slice(
        10,
        2,
        &[
            0.01, -0.01, -0.02, 0.02, 0.015, -0.015, -0.01, 0.01, 0.02, -0.02, -0.015, 0.015,
            0.005, -0.005, -0.02, 0.02, 0.01, -0.01, -0.005, 0.005,
        ],
    );
    manager.update_risk_model(&returns, &ids, 1);

    let forecasts = HashMap::from([(InternalId(1), 0.0), (InternalId(2), 0.0)]);
    let neutral = manager.optimize(&forecasts, None);
    // zero idiosyncratic forecasts and no factor return should sit near flat
    assert!(neutral[&InternalId(1)].abs() < 0.2);
    assert!(neutral[&InternalId(2)].abs() < 0.2);

    // the two assets are anti-correlated, so PCA fits an opposite-sign
    // loading across them; a positive factor return tilts mu in opposite
    // directions for the two assets through mu = loadings * factor_returns.
    let factor_returns = [0.05];
    let tilted = manager.optimize(&forecasts, Some(&factor_returns));
    assert!(
        tilted[&InternalId(1)] * tilted[&InternalId(2)] < 0.0,
        "a factor return through opposite-signed loadings should drive opposite-signed weights"
    );
}

/// Invariant: once the drawdown kill-switch trips, the portfolio manager
/// must never authorize trading again for the remainder of the process,
/// regardless of subsequent equity recovery.
#[test]
fn kill_switch_absorption_invariant() {
    let mut manager = PortfolioManager::new(OptimizerParams::default(), dec!(-0.1), 1000);
    let t0 = Utc::now();

    assert!(manager.check_safety(dec!(10_000), t0));
    assert!(!manager.check_safety(dec!(8_000), t0));
    assert!(manager.is_killed());

    for i in 1..10 {
        let later = t0 + chrono::Duration::seconds(i);
        assert!(!manager.check_safety(dec!(50_000), later), "a killed portfolio must stay killed");
    }
}

/// Invariant: a tiny forecast perturbation should not cause a large jump
/// in the optimizer's output weights.
#[test]
fn optimizer_stability_under_tiny_forecast_perturbation() {
    let mut manager = PortfolioManager::new(OptimizerParams::default(), dec!(-0.1), 1000);
    let ids = vec![InternalId(1), InternalId(2), InternalId(3)];
    let returns = DMatrix::from_row_slice(
        12,
        3,
        &[
            0.01, -0.01, 0.02, -0.02, 0.01, -0.03, 0.015, -0.015, 0.01, -0.01, 0.02, -0.02, 0.005,
            -0.005, 0.015, -0.02, 0.015, 0.01, 0.01, -0.01, -0.02, -0.005, 0.005, 0.02, 0.01,
            -0.01, 0.03, -0.015, 0.01, -0.015, 0.02, -0.02, -0.01, 0.005, -0.015, -0.02,
        ],
    );
    manager.update_risk_model(&returns, &ids, 2);

    let base = HashMap::from([(InternalId(1), 0.02), (InternalId(2), -0.01), (InternalId(3), 0.005)]);
    let w1 = manager.optimize(&base, None);

    let perturbed = HashMap::from([(InternalId(1), 0.0201), (InternalId(2), -0.0099), (InternalId(3), 0.0051)]);
    let w2 = manager.optimize(&perturbed, None);

    for id in ids {
        assert!((w1[&id] - w2[&id]).abs() < 0.1);
    }
}
