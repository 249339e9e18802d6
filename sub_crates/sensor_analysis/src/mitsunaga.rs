//! Mitsunaga & Nayar polynomial response recovery.
//!
//! The inverse response is modeled as a polynomial `f(M) = sum(c_n M^n)`
//! over normalized pixel values `M` in [0, 1], constrained so that
//! `f(1) = I_max`.  For each candidate degree the coefficients are fit by
//! least squares against the exposure ratios of adjacent exposures, and
//! the ratios are then re-estimated from the fit until the coefficients
//! settle.
//!
//! Degree selection follows a fixed rule: the chosen degree is the one
//! with the smallest fit error *among candidates whose error is strictly
//! greater than `MitsunagaConfig::error_floor`*.  Candidates at or below
//! the floor are never chosen, even when they fit better.  If every
//! candidate is at or below the floor, estimation fails.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use crate::{
    debevec, ensure_usable,
    error::{EstimateError, Result},
    robertson,
    sample::downsample_all,
    utils::{eval_polynomial, solve_least_squares},
    validate_samples, ExposureSample, MitsunagaConfig, ReferenceMethod, ResponseConfig,
    ResponseCurve, INTENSITY_COUNT,
};

/// Below this, `f(M)` is treated as zero when forming exposure ratios.
const MIN_RESPONSE: f64 = 1.0e-6;

/// A fitted polynomial for one candidate degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub degree: usize,

    /// `degree + 1` coefficients, lowest order first.
    pub coefficients: Vec<f64>,

    /// Sum of squared deviations between modeled and nominal exposure
    /// ratios.
    pub error: f64,

    /// Number of solve/refine iterations that ran.
    pub iterations: usize,
}

impl Candidate {
    pub fn eval(&self, m: f64) -> f64 {
        eval_polynomial(&self.coefficients, m)
    }
}

pub fn estimate(samples: &[ExposureSample], config: &ResponseConfig) -> Result<ResponseCurve> {
    let candidates = fit_candidates(samples, config)?;
    let floor = config.mitsunaga.error_floor;
    let best = select_degree(&candidates, floor).ok_or_else(|| {
        EstimateError::NoDegreeAboveFloor {
            floor: floor,
            errors: candidates.iter().map(|c| (c.degree, c.error)).collect(),
        }
    })?;
    info!(
        degree = best.degree,
        error = best.error,
        "Selected Mitsunaga polynomial degree"
    );

    let reference = match config.mitsunaga.reference {
        ReferenceMethod::Debevec => debevec::estimate(samples, config)?,
        ReferenceMethod::Robertson => robertson::estimate(samples, config)?,
    };

    Ok(curve_from_polynomial(
        &best.coefficients,
        config.anchor,
        &reference,
    ))
}

/// Fits one polynomial per configured degree.
///
/// Samples are sorted by exposure time and downsampled to the sample grid
/// first.  The result is in degree order.
pub fn fit_candidates(
    samples: &[ExposureSample],
    config: &ResponseConfig,
) -> Result<Vec<Candidate>> {
    validate_samples(samples)?;
    if samples.len() < 2 {
        return Err(EstimateError::TooFewExposures {
            method: "mitsunaga",
            needed: 2,
            found: samples.len(),
        });
    }

    let mut sorted = downsample_all(samples, config.sample_grid)?;
    ensure_usable(&sorted, &config.weights)?;
    sorted.sort_by(|a, b| a.exposure.total_cmp(&b.exposure));

    let normalized: Vec<Vec<f64>> = sorted
        .iter()
        .map(|s| {
            s.pixels
                .iter()
                .map(|&z| z as f64 / (INTENSITY_COUNT - 1) as f64)
                .collect()
        })
        .collect();
    let nominal_ratios: Vec<f64> = sorted
        .windows(2)
        .map(|pair| pair[0].exposure / pair[1].exposure)
        .collect();

    config
        .mitsunaga
        .degrees
        .clone()
        .map(|degree| fit_degree(&normalized, &nominal_ratios, degree, &config.mitsunaga))
        .collect()
}

/// Picks the candidate with the lowest error among those whose error is
/// strictly above `floor`.  Ties go to the lower degree.
pub fn select_degree(candidates: &[Candidate], floor: f64) -> Option<&Candidate> {
    candidates
        .iter()
        .filter(|c| c.error > floor)
        .min_by(|a, b| a.error.total_cmp(&b.error))
}

/// Converts polynomial coefficients into a log response curve.
///
/// The log curve is anchored to zero at `anchor` and then affinely mapped
/// onto the value range of `reference`, so that it is on the same scale
/// as the other estimators' output.
pub fn curve_from_polynomial(
    coefficients: &[f64],
    anchor: usize,
    reference: &ResponseCurve,
) -> ResponseCurve {
    let mut g = [0.0f64; INTENSITY_COUNT];
    for (z, v) in g.iter_mut().enumerate() {
        let m = z as f64 / (INTENSITY_COUNT - 1) as f64;
        *v = eval_polynomial(coefficients, m).max(MIN_RESPONSE).ln();
    }

    let offset = g[anchor];
    for v in g.iter_mut() {
        *v -= offset;
    }

    let anchored = ResponseCurve::from_fn(|z| g[z]);
    let (min_g, max_g) = anchored.range();
    let (min_ref, max_ref) = reference.range();
    let range_g = if max_g != min_g { max_g - min_g } else { 1.0e-6 };

    ResponseCurve::from_fn(|z| min_ref + (max_ref - min_ref) * (g[z] - min_g) / range_g)
}

fn fit_degree(
    normalized: &[Vec<f64>],
    nominal_ratios: &[f64],
    degree: usize,
    config: &MitsunagaConfig,
) -> Result<Candidate> {
    let mut ratios = nominal_ratios.to_vec();
    let mut previous: Option<Vec<f64>> = None;
    let mut coefficients = Vec::new();
    let mut iterations = 0;

    for _ in 0..config.max_iterations.max(1) {
        iterations += 1;
        coefficients = solve_coefficients(normalized, &ratios, degree, config.i_max)?;
        let refined = refine_ratios(normalized, &coefficients, &ratios);

        if let Some(ref previous) = previous {
            let change = coefficients
                .iter()
                .zip(previous.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            if change < config.tolerance {
                break;
            }
        }

        previous = Some(coefficients.clone());
        ratios = refined;
    }

    let error = fit_error(normalized, nominal_ratios, &coefficients);
    debug!(degree, error, iterations, "Fit Mitsunaga polynomial");

    Ok(Candidate {
        degree: degree,
        coefficients: coefficients,
        error: error,
        iterations: iterations,
    })
}

/// Least-squares fit of the lower `degree` coefficients for fixed
/// exposure ratios; the top coefficient follows from `f(1) = i_max`.
fn solve_coefficients(
    normalized: &[Vec<f64>],
    ratios: &[f64],
    degree: usize,
    i_max: f64,
) -> Result<Vec<f64>> {
    let pixel_count = normalized[0].len();
    let row_count = ratios.len() * pixel_count;
    let top = degree as i32;

    let mut a = DMatrix::<f64>::zeros(row_count, degree);
    let mut b = DVector::<f64>::zeros(row_count);
    let mut k = 0;
    for (q, &r) in ratios.iter().enumerate() {
        for p in 0..pixel_count {
            let m1 = normalized[q][p];
            let m2 = normalized[q + 1][p];
            let top_term = m1.powi(top) - r * m2.powi(top);
            for n in 0..degree {
                let n = n as i32;
                a[(k, n as usize)] = (m1.powi(n) - r * m2.powi(n)) - top_term;
            }
            b[k] = -i_max * top_term;
            k += 1;
        }
    }

    let x = solve_least_squares(a, b)?;
    let mut coefficients: Vec<f64> = x.iter().copied().collect();
    let top_coefficient = i_max - coefficients.iter().sum::<f64>();
    coefficients.push(top_coefficient);

    Ok(coefficients)
}

/// Re-estimates each adjacent-pair ratio as the mean modeled response
/// ratio.  Pairs with no usable pixels keep their current ratio.
fn refine_ratios(normalized: &[Vec<f64>], coefficients: &[f64], current: &[f64]) -> Vec<f64> {
    current
        .iter()
        .enumerate()
        .map(|(q, &r)| {
            let mut sum = 0.0;
            let mut count = 0usize;
            for (&m1, &m2) in normalized[q].iter().zip(normalized[q + 1].iter()) {
                let f2 = eval_polynomial(coefficients, m2);
                if f2 > MIN_RESPONSE {
                    sum += eval_polynomial(coefficients, m1) / f2;
                    count += 1;
                }
            }
            if count > 0 {
                sum / count as f64
            } else {
                r
            }
        })
        .collect()
}

fn fit_error(normalized: &[Vec<f64>], ratios: &[f64], coefficients: &[f64]) -> f64 {
    let mut error = 0.0;
    for (q, &r) in ratios.iter().enumerate() {
        for (&m1, &m2) in normalized[q].iter().zip(normalized[q + 1].iter()) {
            let f2 = eval_polynomial(coefficients, m2);
            if f2 > MIN_RESPONSE {
                let deviation = eval_polynomial(coefficients, m1) / f2 - r;
                error += deviation * deviation;
            }
        }
    }
    error
}
