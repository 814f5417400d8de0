//! Probabilistic OR, the single rule used to fold independent evidence.
//!
//! `or(p, q) = p + q - p*q`, and over many terms `1 - Π(1 - p_i)`.
//! The result is commutative and clamped to [0, 1].

/// Combines two independent probabilities.
#[inline]
pub fn or(p: f64, q: f64) -> f64 {
    clamp(p + q - p * q)
}

/// Combines any number of independent probabilities; empty input gives 0.
pub fn combine<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let miss: f64 = probabilities.into_iter().map(|p| 1.0 - p).product();
    clamp(1.0 - miss)
}

/// Clamps into [0, 1]; NaN becomes 0.
#[inline]
pub fn clamp(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
