//! Regression evaluation metrics

/// Mean squared error. Returns 0 for empty input.
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len(), "slices must have same length");
    if y_true.is_empty() {
        return 0.0;
    }
    let sum_sq_error: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    sum_sq_error / y_true.len() as f64
}

/// Coefficient of determination.
///
/// R² = 1 - SS_res / SS_tot. When the targets have no variance the score is
/// 1 for a perfect fit and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len(), "slices must have same length");
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse() {
        assert_eq!(mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]), 4.0 / 3.0);
        assert_eq!(mean_squared_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(r2_score(&y, &[2.5; 4]), 0.0);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[70.0, 70.0], &[65.0, 75.0]), 0.0);
        assert_eq!(r2_score(&[70.0, 70.0], &[70.0, 70.0]), 1.0);
    }

    #[test]
    fn test_r2_can_be_negative() {
        assert!(r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
    }
}
