use crate::frame::Frame;
use quant_instrument::{InternalId, Timeframe};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

pub type FrameKey = (InternalId, chrono::DateTime<chrono::Utc>);
pub type ComputeFn = Arc<dyn Fn(&Frame) -> HashMap<FrameKey, f64> + Send + Sync>;

/// `{ name, compute, dependencies }` — a single entry in the process-wide
/// feature registry (§3, §4.B).
#[derive(Clone)]
pub struct FeatureDef {
    pub name: String,
    pub compute: ComputeFn,
    pub deps: Vec<String>,
}

impl std::fmt::Debug for FeatureDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureDef")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish()
    }
}

static REGISTRY: OnceLock<RwLock<HashMap<String, FeatureDef>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, FeatureDef>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Looks up a registered feature by name. `None` for anything never
/// registered — the caller (hydration) treats this as "skip silently",
/// never as an error (§4.B, §7).
pub fn lookup(name: &str) -> Option<FeatureDef> {
    registry().read().expect("feature registry poisoned").get(name).cloned()
}

/// Registers a single feature. The registry is populated once at process
/// start and never mutated thereafter (§9 Design Notes); re-registering
/// the same name overwrites the previous definition, which is only safe
/// before any run has begun.
pub fn register_feature(name: impl Into<String>, deps: Vec<String>, compute: ComputeFn) {
    let name = name.into();
    registry()
        .write()
        .expect("feature registry poisoned")
        .insert(name.clone(), FeatureDef { name, compute, deps });
}

/// Expands a `multi_tf_feature` declaration into one registry entry per
/// timeframe: `<base_name>_<tf>` depending on `<dep>_<tf>` for each `dep`
/// (§4.B). `compute_factory` builds the per-timeframe compute closure,
/// since the column names it reads/writes are themselves suffixed.
pub fn multi_tf_feature(
    base_name: &str,
    timeframes: &[Timeframe],
    deps: &[&str],
    compute_factory: impl Fn(Timeframe) -> ComputeFn,
) {
    for &timeframe in timeframes {
        let name = format!("{base_name}_{timeframe}");
        let scoped_deps = deps.iter().map(|dep| format!("{dep}_{timeframe}")).collect();
        register_feature(name, scoped_deps, compute_factory(timeframe));
    }
}
