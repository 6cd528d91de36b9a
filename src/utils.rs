//! Numeric helpers shared by the pipeline stages.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`), or `None` for an empty slice.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let sum_sq: f64 = values.iter().map(|value| (value - mu).powi(2)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation, or `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Whether every value equals the first; true for empty and single-value slices.
pub fn all_equal(values: &[f64]) -> bool {
    match values.split_first() {
        None => true,
        Some((first, rest)) => rest.iter().all(|value| value == first),
    }
}

/// Parse a numeric cell, tolerating surrounding whitespace and `,` thousands separators.
///
/// Returns `None` for empty, unparseable, or non-finite values.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|ch| *ch != ',').collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_variance_of_empty_slice_are_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_variance(&[]), None);
        assert_eq!(population_std(&[]), None);
    }

    #[test]
    fn population_std_divides_by_n() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert!((population_std(&values).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn all_equal_treats_short_slices_as_constant() {
        assert!(all_equal(&[]));
        assert!(all_equal(&[3.0]));
        assert!(all_equal(&[0.1, 0.1]));
        assert!(!all_equal(&[0.1, 0.2]));
    }

    #[test]
    fn parse_numeric_strips_separators_and_rejects_garbage() {
        assert_eq!(parse_numeric(" 1,234.50 "), Some(1234.5));
        assert_eq!(parse_numeric("34.1"), Some(34.1));
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("n/a"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }
}
