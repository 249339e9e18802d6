//! Debevec & Malik response recovery.
//!
//! Solves one regularized linear least-squares system whose unknowns are
//! the 256 entries of the log response curve `g` plus the log irradiance
//! `ln E` of every sampled pixel:
//!
//! - one row per (pixel, exposure): `w(z)·g(z) - w(z)·ln E = w(z)·ln t`
//! - one anchor row: `g(anchor) = 0`
//! - one smoothness row per interior intensity:
//!   `λ·w(z)·(g(z-1) - 2·g(z) + g(z+1)) = 0`

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::{
    ensure_usable,
    error::Result,
    sample::downsample_all,
    utils::solve_least_squares,
    validate_samples, ExposureSample, ResponseConfig, ResponseCurve, INTENSITY_COUNT,
};

pub fn estimate(samples: &[ExposureSample], config: &ResponseConfig) -> Result<ResponseCurve> {
    validate_samples(samples)?;
    let samples = downsample_all(samples, config.sample_grid)?;
    let weights = &config.weights;
    ensure_usable(&samples, weights)?;

    let n = INTENSITY_COUNT;
    let pixel_count = samples[0].pixels.len();
    let row_count = pixel_count * samples.len() + 1 + (n - 2);
    let col_count = n + pixel_count;
    debug!(
        rows = row_count,
        cols = col_count,
        "Building Debevec system"
    );

    let mut a = DMatrix::<f64>::zeros(row_count, col_count);
    let mut b = DVector::<f64>::zeros(row_count);
    let mut k = 0;

    // Data-fitting rows.
    for i in 0..pixel_count {
        for sample in samples.iter() {
            let z = sample.pixels[i];
            let w = weights[z];
            a[(k, z as usize)] = w;
            a[(k, n + i)] = -w;
            b[k] = w * sample.exposure.ln();
            k += 1;
        }
    }

    // Fix the curve's offset.
    a[(k, config.anchor)] = 1.0;
    k += 1;

    // Smoothness.
    for z in 1..(n - 1) {
        let w = config.smoothness * weights[z as u8];
        a[(k, z - 1)] = w;
        a[(k, z)] = -2.0 * w;
        a[(k, z + 1)] = w;
        k += 1;
    }
    debug_assert_eq!(k, row_count);

    let x = solve_least_squares(a, b)?;

    // The log irradiances are only nuisance variables.
    Ok(ResponseCurve::from_fn(|z| x[z]))
}
