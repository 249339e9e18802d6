use nalgebra::{DMatrix, DVector};

use crate::error::{EstimateError, Result};

/// Solves `a * x = b` in the least-squares sense using the SVD
/// pseudo-inverse.
///
/// Singular values below `eps * max(rows, cols) * largest` are treated as
/// zero, so rank-deficient systems (e.g. unknowns that no row touches)
/// get the minimum-norm solution instead of blowing up.
pub(crate) fn solve_least_squares(a: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(EstimateError::Solver("empty system".into()));
    }
    let size = a.nrows().max(a.ncols()) as f64;
    let svd = a.svd(true, true);
    let eps = f64::EPSILON * size * svd.singular_values.max();

    let x = svd
        .solve(&b, eps)
        .map_err(|e| EstimateError::Solver(e.to_string()))?;

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(EstimateError::Solver("solution is not finite".into()))
    }
}

/// Smooths `values` with a normalized 1-D Gaussian.
///
/// The kernel is truncated at four sigmas, and the signal is mirrored at
/// the ends (`d c b a | a b c d | d c b a`).
pub(crate) fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    if values.is_empty() || !(sigma > 0.0) {
        return values.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as isize;
    let kernel: Vec<f64> = {
        let k: Vec<f64> = (-radius..=radius)
            .map(|i| (-0.5 * (i * i) as f64 / (sigma * sigma)).exp())
            .collect();
        let norm = 1.0 / k.iter().sum::<f64>();
        k.iter().map(|v| v * norm).collect()
    };

    let len = values.len() as isize;
    let reflect = |mut i: isize| -> usize {
        // Loop for kernels wider than the signal itself.
        loop {
            if i < 0 {
                i = -i - 1;
            } else if i >= len {
                i = 2 * len - i - 1;
            } else {
                return i as usize;
            }
        }
    };

    (0..len)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| values[reflect(i + k as isize - radius)] * w)
                .sum()
        })
        .collect()
}

/// Evaluates `sum(coefficients[n] * x^n)`.
#[inline]
pub(crate) fn eval_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_exact() {
        // x + y = 3, x - y = 1
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, -1.0]);
        let b = DVector::from_vec(vec![3.0, 1.0]);
        let x = solve_least_squares(a, b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn least_squares_overdetermined() {
        // Fit y = m*x through points that aren't quite on a line.
        let a = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.3]);
        let x = solve_least_squares(a, b).unwrap();
        let expected = (1.0 + 4.0 + 9.9) / 14.0;
        assert!((x[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn least_squares_rank_deficient() {
        // Second unknown is never constrained: min-norm puts it at zero.
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 4.0, 0.0]);
        let b = DVector::from_vec(vec![2.0, 4.0]);
        let x = solve_least_squares(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn smooth_constant() {
        let v = vec![3.0; 40];
        for s in gaussian_smooth(&v, 4.0) {
            assert!((s - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn smooth_preserves_sum_of_linear_interior() {
        // A linear ramp is unchanged away from the ends.
        let v: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let s = gaussian_smooth(&v, 2.0);
        for i in 10..90 {
            assert!((s[i] - v[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn smooth_spike_spreads() {
        let mut v = vec![0.0; 41];
        v[20] = 1.0;
        let s = gaussian_smooth(&v, 4.0);
        assert!(s[20] < 1.0);
        assert!(s[19] > 0.0 && (s[19] - s[21]).abs() < 1e-12);
        assert!((s.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn polynomial() {
        // 1 + 2x + 3x^2 at x = 2
        assert_eq!(eval_polynomial(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_eq!(eval_polynomial(&[], 2.0), 0.0);
    }
}
