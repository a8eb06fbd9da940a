/// Divides, or returns `None` when there is nothing to divide by.
pub fn div_or_none(lhs: f64, rhs: f64) -> Option<f64> {
    if rhs == 0.0 {
        None
    } else {
        Some(lhs / rhs)
    }
}

/// Sample variance from a count, sum and sum of squares.
pub fn sample_variance(n: u32, sum: f64, sum_sq: f64) -> Option<f64> {
    if n < 2 {
        return None;
    }

    let n = n as f64;
    Some(((sum_sq - sum * sum / n) / (n - 1.0)).max(0.0))
}
