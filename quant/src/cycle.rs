use chrono::{DateTime, Utc};
use quant_alpha::{combine, run, zscore, AlphaModel, RunConfig};
use quant_data::DataPlatform;
use quant_execution::{Broker, Scheduler};
use quant_instrument::InternalId;
use quant_risk::PortfolioManager;
use rust_decimal::prelude::FromPrimitive as _;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One model entry in a cycle's combination step: the model itself and
/// its blend weight passed to [`combine`].
pub struct WeightedModel<'a> {
    pub model: &'a dyn AlphaModel,
    pub weight: f64,
}

/// Wires the four core crates into the single trading-cycle pipeline
/// `spec.md` §2 describes: A (data) feeds B (alpha) per model, the
/// signals are combined and handed to C (the optimizer), whose target
/// weights are converted to goal share counts at the broker's latest
/// prices and handed to D (the scheduler) as a `rebalance`.
///
/// A `Cycle` owns the driver-side state for one strategy; it is not
/// itself a CLI or a demo — callers (a backtest loop or a live driver,
/// both out of this workspace's scope) advance `now`/`timestamp` and
/// invoke [`Cycle::run_cycle`] repeatedly.
pub struct Cycle<B> {
    pub platform: Arc<DataPlatform>,
    pub manager: PortfolioManager,
    pub scheduler: Scheduler<B>,
}

impl<B> Cycle<B>
where
    B: Broker + Send + Sync + 'static,
{
    pub fn new(platform: Arc<DataPlatform>, manager: PortfolioManager, scheduler: Scheduler<B>) -> Self {
        Self { platform, manager, scheduler }
    }

    /// Runs one A->B->C->D cycle for `ids` at `run_config.timestamp`.
    /// Returns `None` without trading if `check_safety` vetoes the cycle
    /// (`spec.md` §4.C safety rails / §7 `SafetyBlock` — "callers must not
    /// trade when `check_safety` returns false"), otherwise `Some` of the
    /// optimizer's target weights.
    ///
    /// `factor_returns`, when supplied, is forwarded to
    /// [`PortfolioManager::optimize`] so the optimizer tilts `μ` by
    /// `loadings · factor_returns` (`spec.md` §4.C) — e.g. a macro factor
    /// forecast the driver holds independently of the per-model signals.
    pub async fn run_cycle(
        &mut self,
        models: &[WeightedModel<'_>],
        ids: &[InternalId],
        run_config: RunConfig,
        equity: Decimal,
        now: DateTime<Utc>,
        capital: Decimal,
        rebalance_interval: Duration,
        factor_returns: Option<&[f64]>,
    ) -> Option<HashMap<InternalId, f64>> {
        if !self.manager.check_safety(equity, now) {
            info!("cycle skipped: safety rails vetoed trading");
            return None;
        }

        let mut zscored = Vec::with_capacity(models.len());
        let mut blend_weights = Vec::with_capacity(models.len());
        for entry in models {
            let raw = run(Arc::clone(&self.platform), entry.model, ids, run_config).await;
            zscored.push(zscore(&raw));
            blend_weights.push(entry.weight);
        }
        let combined = combine(&zscored, Some(&blend_weights));

        let target_weights = self.manager.optimize(&combined, factor_returns);
        self.convert_and_rebalance(&target_weights, capital, rebalance_interval).await;

        Some(target_weights)
    }

    /// Converts `target_weights` (fraction of `capital` per id) into
    /// goal share counts at the broker's latest prices, then drives the
    /// scheduler towards them (`spec.md` §2: "convert to goal share
    /// counts using latest prices").
    async fn convert_and_rebalance(
        &self,
        target_weights: &HashMap<InternalId, f64>,
        capital: Decimal,
        interval: Duration,
    ) {
        let reverse = self.platform.reverse_ism();
        let tickers: Vec<_> = target_weights.keys().filter_map(|id| reverse.get(id).cloned()).collect();
        if tickers.is_empty() {
            return;
        }

        let prices = self.scheduler.broker().get_prices(&tickers).await;

        let mut goal_positions = HashMap::with_capacity(target_weights.len());
        for (&id, &weight) in target_weights {
            let Some(ticker) = reverse.get(&id) else { continue };
            let Some(&price) = prices.get(ticker) else { continue };
            if price.is_zero() {
                continue;
            }
            let Some(weight_dec) = Decimal::from_f64_retain(weight) else { continue };
            let qty = weight_dec * capital / price;
            goal_positions.insert(ticker.clone(), qty);
        }

        debug!(tickers = goal_positions.len(), "rebalancing to target weights");
        self.scheduler.rebalance(&goal_positions, interval).await;
    }
}
