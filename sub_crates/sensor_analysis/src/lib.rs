//! A crate for estimating camera sensor response curves from bracketed
//! exposures of a static scene.
//!
//! Three estimators are provided, each producing a `ResponseCurve` (a
//! mapping from 8-bit pixel value to log relative exposure) for a single
//! color channel:
//!
//! - `debevec`: closed-form regularized least squares.
//! - `robertson`: alternating irradiance/curve optimization.
//! - `mitsunaga`: polynomial inverse-response fitting with degree selection.

mod config;
mod error;
mod sample;
mod utils;
mod weights;

pub mod debevec;
pub mod mitsunaga;
pub mod robertson;

use std::ops::Index;

pub use config::{MitsunagaConfig, ReferenceMethod, ResponseConfig, RobertsonConfig};
pub use error::{EstimateError, Result};
pub use sample::ExposureSample;
pub use weights::WeightTable;

/// Number of distinct 8-bit intensities.
pub const INTENSITY_COUNT: usize = 256;

/// Log relative exposure for each 8-bit intensity of one color channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    values: [f64; INTENSITY_COUNT],
}

impl ResponseCurve {
    pub fn from_fn<F: FnMut(usize) -> f64>(mut f: F) -> ResponseCurve {
        let mut values = [0.0f64; INTENSITY_COUNT];
        for (z, v) in values.iter_mut().enumerate() {
            *v = f(z);
        }
        ResponseCurve { values: values }
    }

    pub fn values(&self) -> &[f64; INTENSITY_COUNT] {
        &self.values
    }

    /// Returns (min, max) of the curve values.
    pub fn range(&self) -> (f64, f64) {
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

impl Index<u8> for ResponseCurve {
    type Output = f64;

    #[inline(always)]
    fn index(&self, z: u8) -> &f64 {
        &self.values[z as usize]
    }
}

/// The available response curve estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMethod {
    Debevec,
    Robertson,
    Mitsunaga,
}

impl ResponseMethod {
    pub const ALL: [ResponseMethod; 3] = [
        ResponseMethod::Debevec,
        ResponseMethod::Robertson,
        ResponseMethod::Mitsunaga,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResponseMethod::Debevec => "debevec",
            ResponseMethod::Robertson => "robertson",
            ResponseMethod::Mitsunaga => "mitsunaga",
        }
    }

    /// Estimates the response curve of one channel from its exposures.
    pub fn estimate(
        &self,
        samples: &[ExposureSample],
        config: &ResponseConfig,
    ) -> Result<ResponseCurve> {
        match self {
            ResponseMethod::Debevec => debevec::estimate(samples, config),
            ResponseMethod::Robertson => robertson::estimate(samples, config),
            ResponseMethod::Mitsunaga => mitsunaga::estimate(samples, config),
        }
    }
}

impl std::fmt::Display for ResponseMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ResponseMethod {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        ResponseMethod::ALL
            .iter()
            .copied()
            .find(|m| m.name() == lower)
            .ok_or_else(|| EstimateError::UnknownMethod(s.to_string()))
    }
}

/// Checks the invariants every estimator relies on: at least one sample,
/// identical dimensions, and positive, finite, distinct exposure times.
pub(crate) fn validate_samples(samples: &[ExposureSample]) -> Result<()> {
    let first = samples.first().ok_or(EstimateError::Empty)?;
    let expected = first.dimensions();

    for (i, sample) in samples.iter().enumerate() {
        if sample.dimensions() != expected || sample.pixels.len() != expected.0 * expected.1 {
            return Err(EstimateError::DimensionMismatch {
                index: i,
                expected: expected,
                found: sample.dimensions(),
            });
        }
        if !(sample.exposure > 0.0 && sample.exposure.is_finite()) {
            return Err(EstimateError::InvalidExposure {
                index: i,
                exposure: sample.exposure,
            });
        }
        if samples[..i].iter().any(|s| s.exposure == sample.exposure) {
            return Err(EstimateError::DuplicateExposure(sample.exposure));
        }
    }

    Ok(())
}

/// Fails if no pixel of any sample carries non-zero weight.
pub(crate) fn ensure_usable(samples: &[ExposureSample], weights: &WeightTable) -> Result<()> {
    let usable = samples
        .iter()
        .any(|s| s.pixels.iter().any(|&z| weights[z] > 0.0));
    if usable {
        Ok(())
    } else {
        Err(EstimateError::NoUsableSamples)
    }
}
