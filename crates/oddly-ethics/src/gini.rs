//! Gini coefficient and the fairness score policy.

/// Gini coefficient of a share vector, in [0, 1].
///
/// Standard sorted formula: with shares sorted ascending and 1-indexed,
/// `G = (2*Σ(i*x_i) - (n+1)*Σx_i) / (n*Σx_i)`.
///
/// Boundary cases are defined, not errors: fewer than two participants is
/// perfectly equal by definition (G = 0), as is an all-zero vector.
pub fn gini_coefficient(shares: &[f64]) -> f64 {
    let n = shares.len();
    if n < 2 {
        return 0.0;
    }

    let total: f64 = shares.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let mut sorted = shares.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();

    let g = (2.0 * weighted - (n as f64 + 1.0) * total) / (n as f64 * total);
    g.clamp(0.0, 1.0)
}

/// Fairness score policy: `1 - G`, reduced by 0.15 per red flag, clamped
/// to [0, 1].
///
/// Monotone in the red-flag count; G = 0 with zero red flags yields
/// exactly 1.0.
pub fn fairness_score(gini: f64, red_flag_count: usize) -> f64 {
    ((1.0 - gini) - 0.15 * red_flag_count as f64).clamp(0.0, 1.0)
}
