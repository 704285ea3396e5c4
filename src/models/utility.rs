/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Linearly interpolated quantile of an already sorted slice, `p` in 0.0..=1.0.
/// Returns 0.0 for empty input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Gaussian kernel density of `samples` evaluated at `x`.
pub fn gaussian_kde(samples: &[f64], bandwidth: f64, x: f64) -> f64 {
    if samples.is_empty() || bandwidth <= 0.0 {
        return 0.0;
    }
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * samples.len() as f64);
    samples
        .iter()
        .map(|s| {
            let z = (x - s) / bandwidth;
            (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        * norm
}

/// Silverman's rule-of-thumb bandwidth. Falls back to 0.5 (half a rating step)
/// when the samples have no spread.
pub fn silverman_bandwidth(samples: &[f64]) -> f64 {
    let sd = stddev(samples, mean(samples));
    if sd == 0.0 {
        return 0.5;
    }
    1.06 * sd * (samples.len() as f64).powf(-0.2)
}
