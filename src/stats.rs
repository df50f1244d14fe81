//! Descriptive statistics shared by feature extraction and tree building.

/// Arithmetic mean. Returns 0.0 for an empty slice.
#[must_use]
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance. Returns 0.0 for an empty slice.
#[must_use]
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f32]) -> f32 {
    variance(values).sqrt()
}

/// Median with midpoint interpolation for even-length input.
/// Returns 0.0 for an empty slice.
#[must_use]
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Least-squares slope of `values` regressed on their 0-based index.
///
/// This is the trend signal the feature layer leans on: a declining
/// attendance or mark history produces a negative slope regardless of
/// the current snapshot value. Returns 0.0 when fewer than 2 points
/// exist or the index variance vanishes.
#[must_use]
pub fn linreg_slope(values: &[f32]) -> f32 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f32 / 2.0;
    let y_mean = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f32 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
