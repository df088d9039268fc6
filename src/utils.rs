//! Numeric helpers used across evaluation routines.

/// Numerically stable `ln(sum(exp(x_i)))`.
///
/// Returns `-inf` for an empty slice or when every term is `-inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Element-wise closeness check in the style of `allclose`:
/// `|a - b| <= atol + rtol * |b|` for every pair, with equal lengths.
pub fn all_close(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(&x, &y)| (x - y).abs() <= atol + rtol * y.abs())
}

/// Relative closeness of two scalars, treating two infinities of the same sign as equal.
pub fn is_close(a: f64, b: f64, rtol: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= rtol * a.abs().max(b.abs())
}
