//! Small statistics helpers shared by the sky estimator and the solver

use num_traits::Float;

/// Median of a slice; the input is copied and partially sorted
pub fn median<T>(sample: &[T]) -> Option<T>
where
    T: Float,
{
    if sample.is_empty() {
        return None;
    }

    let mut sorted: Vec<T> = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let value = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        let half = T::from(0.5).unwrap_or_else(T::zero);
        (sorted[n / 2 - 1] + sorted[n / 2]) * half
    };
    Some(value)
}

/// Median absolute deviation scaled to the Gaussian standard deviation
pub fn mad<T>(sample: &[T]) -> Option<T>
where
    T: Float,
{
    let med = median(sample)?;
    let abs_dev: Vec<T> = sample.iter().map(|&x| (x - med).abs()).collect();
    let scale = T::from(1.4826).unwrap_or_else(T::one);
    median(&abs_dev).map(|m| m * scale)
}

/// Weighted mean; `None` for empty or mismatched input or zero total weight
pub fn weighted_mean<T>(values: &[T], weights: &[T]) -> Option<T>
where
    T: Float,
{
    if values.is_empty() || values.len() != weights.len() {
        return None;
    }

    let (sum, weight_sum) = values
        .iter()
        .zip(weights.iter())
        .fold((T::zero(), T::zero()), |(sum, weight_sum), (&v, &w)| {
            (sum + v * w, weight_sum + w)
        });

    if weight_sum.is_zero() {
        None
    } else {
        Some(sum / weight_sum)
    }
}

/// Abscissa of the vertex of the parabola through three points
///
/// Returns a non-finite value when the points are collinear or otherwise
/// degenerate; callers are expected to fall back on their own default.
pub fn quadratic_vertex(x: &[f64; 3], y: &[f64; 3]) -> f64 {
    let denom = (x[0] - x[1]) * (x[0] - x[2]) * (x[1] - x[2]);
    let a = (x[2] * (y[1] - y[0]) + x[1] * (y[0] - y[2]) + x[0] * (y[2] - y[1])) / denom;
    let b = (x[2] * x[2] * (y[0] - y[1])
        + x[1] * x[1] * (y[2] - y[0])
        + x[0] * x[0] * (y[1] - y[2]))
        / denom;
    -b / (2.0 * a)
}
