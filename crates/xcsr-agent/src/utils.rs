//! Sampling helpers shared by deletion and parent selection

use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

/// Roulette-wheel draw over `weights`.
///
/// Falls back to a uniform draw when the weights do not form a usable
/// distribution (all zero, negative, or not finite). Returns `None` only for
/// an empty slice.
pub fn roulette<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if !total.is_finite() {
        tracing::warn!(len = weights.len(), "non-finite roulette weights, drawing uniformly");
        return Some(rng.gen_range(0..weights.len()));
    }
    match WeightedIndex::new(weights) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(err) => {
            tracing::warn!(%err, len = weights.len(), "degenerate roulette weights, drawing uniformly");
            Some(rng.gen_range(0..weights.len()))
        }
    }
}

/// Mean of `values` weighted by `weights`; `None` when the weights sum to zero
pub fn weighted_mean(values: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let (sum, total) = values
        .into_iter()
        .fold((0.0, 0.0), |(s, t), (v, w)| (s + v * w, t + w));
    if total > 0.0 {
        Some(sum / total)
    } else {
        None
    }
}
