use quant_instrument::InternalId;
use std::collections::HashMap;

/// Cross-sectional z-score: `(v - mean) / stdev`. Returns all-zero (keys
/// preserved) for an empty map, a zero stdev, or a non-finite stdev, never
/// divides by zero or propagates a NaN/infinite scale (§4.B).
pub fn zscore(values: &HashMap<InternalId, f64>) -> HashMap<InternalId, f64> {
    let raw: Vec<f64> = values.values().copied().collect();
    let (mean, std) = quant_integration::numeric::mean_std(&raw);

    if values.is_empty() || std == 0.0 || quant_integration::numeric::is_non_finite(std) {
        return values.keys().map(|&id| (id, 0.0)).collect();
    }

    values.iter().map(|(&id, &v)| (id, (v - mean) / std)).collect()
}

/// Clamps every value to `[-limit, limit]`.
pub fn winsorize(values: &HashMap<InternalId, f64>, limit: f64) -> HashMap<InternalId, f64> {
    values.iter().map(|(&id, &v)| (id, v.clamp(-limit, limit))).collect()
}

/// Weighted sum across `maps`, keyed by id; a map missing a key
/// contributes zero for that key. Defaults to equal `1/N` weights when
/// `weights` is `None` (§4.B, §8 scenario S4).
pub fn combine(maps: &[HashMap<InternalId, f64>], weights: Option<&[f64]>) -> HashMap<InternalId, f64> {
    if maps.is_empty() {
        return HashMap::new();
    }

    let equal = vec![1.0 / maps.len() as f64; maps.len()];
    let weights = weights.unwrap_or(&equal);

    let mut ids: std::collections::HashSet<InternalId> = std::collections::HashSet::new();
    for map in maps {
        ids.extend(map.keys().copied());
    }

    ids.into_iter()
        .map(|id| {
            let total = maps
                .iter()
                .zip(weights)
                .map(|(map, &w)| w * map.get(&id).copied().unwrap_or(0.0))
                .sum();
            (id, total)
        })
        .collect()
}
