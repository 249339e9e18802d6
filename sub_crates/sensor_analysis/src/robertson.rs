//! Robertson et al. iterative response recovery.
//!
//! Works on a linear-domain response table `G`, alternating between
//! estimating per-pixel irradiance from the current table and re-fitting
//! the table from those irradiances.  The loop always runs the configured
//! number of epochs: there is no convergence test.

use tracing::debug;

use crate::{
    ensure_usable, error::EstimateError, error::Result, utils::gaussian_smooth, validate_samples,
    ExposureSample, ResponseConfig, ResponseCurve, WeightTable, INTENSITY_COUNT,
};

/// Floor applied before taking the log of the response table.
const MIN_RESPONSE: f64 = 1.0e-12;

pub fn estimate(samples: &[ExposureSample], config: &ResponseConfig) -> Result<ResponseCurve> {
    validate_samples(samples)?;
    let weights = &config.weights;
    ensure_usable(samples, weights)?;

    // exp(linspace(0, 1, 256))
    let mut table = [0.0f64; INTENSITY_COUNT];
    for (z, g) in table.iter_mut().enumerate() {
        *g = (z as f64 / (INTENSITY_COUNT - 1) as f64).exp();
    }

    let mut irradiance = vec![0.0f64; samples[0].pixels.len()];
    for epoch in 0..config.robertson.epochs {
        debug!(epoch = epoch + 1, "Robertson epoch");
        fit_irradiance(samples, &table, weights, &mut irradiance);
        fit_response(samples, &irradiance, weights, &mut table);

        let anchor = table[config.anchor];
        if !(anchor > 0.0 && anchor.is_finite()) {
            return Err(EstimateError::DegenerateAnchor {
                anchor: config.anchor,
                value: anchor,
            });
        }
        for g in table.iter_mut() {
            *g /= anchor;
        }
    }

    let log_table: Vec<f64> = table.iter().map(|g| g.max(MIN_RESPONSE).ln()).collect();
    let smoothed = gaussian_smooth(&log_table, config.robertson.smoothing_sigma);

    Ok(ResponseCurve::from_fn(|z| smoothed[z]))
}

/// `E = sum(w·G(z)·t) / sum(w·t²)` for every pixel.  Pixels with no
/// weighted observations get an irradiance of zero.
fn fit_irradiance(
    samples: &[ExposureSample],
    table: &[f64; INTENSITY_COUNT],
    weights: &WeightTable,
    irradiance: &mut [f64],
) {
    for (i, e) in irradiance.iter_mut().enumerate() {
        let mut upper = 0.0;
        let mut lower = 0.0;
        for sample in samples.iter() {
            let z = sample.pixels[i];
            let w = weights[z];
            let t = sample.exposure;
            upper += w * table[z as usize] * t;
            lower += w * t * t;
        }
        *e = if lower > 0.0 { upper / lower } else { 0.0 };
    }
}

/// `G(m) = sum(w·E·t) / sum(w)` over all observations with intensity `m`.
/// Intensities without weighted observations keep their previous value.
fn fit_response(
    samples: &[ExposureSample],
    irradiance: &[f64],
    weights: &WeightTable,
    table: &mut [f64; INTENSITY_COUNT],
) {
    let mut upper = [0.0f64; INTENSITY_COUNT];
    let mut lower = [0.0f64; INTENSITY_COUNT];
    for sample in samples.iter() {
        let t = sample.exposure;
        for (&z, &e) in sample.pixels.iter().zip(irradiance.iter()) {
            let w = weights[z];
            upper[z as usize] += w * e * t;
            lower[z as usize] += w;
        }
    }

    for m in 0..INTENSITY_COUNT {
        if lower[m] > 0.0 {
            table[m] = upper[m] / lower[m];
        }
    }
}
