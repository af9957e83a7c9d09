//! Deterministic pseudo-randomness.
//!
//! Shape geometry must be reproducible from `(num_points, roughness, seed)`,
//! so vertex perturbation uses a stateless hash of its input rather than an
//! RNG stream. Everything that is allowed to differ between runs (fresh seeds,
//! random gradients) goes through a seedable [`StdRng`] owned by the caller.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Stateless seeded random in `[0, 1)`: `frac(sin(x) * 10000)`.
pub fn seeded_random(x: f64) -> f64 {
    let v = x.sin() * 10000.0;
    let f = v - v.floor();
    if f.is_finite() {
        f
    } else {
        0.0
    }
}

/// Build the RNG used for user-facing randomization from a numeric seed.
pub fn rng_from_seed(seed: f64) -> StdRng {
    StdRng::seed_from_u64(seed.to_bits())
}

/// Draw a new shape seed the same way the "generate" action does.
pub fn fresh_seed(rng: &mut StdRng) -> f64 {
    (rng.random::<f64>() * 1000.0 * 100.0).round() / 100.0
}
