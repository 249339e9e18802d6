use std::ops::RangeInclusive;

use crate::weights::WeightTable;

/// Settings shared by every response-curve estimator and by radiance
/// fusion.
///
/// Built once per run and passed by reference, so that estimation and
/// fusion are guaranteed to weight pixels identically.
#[derive(Debug, Clone)]
pub struct ResponseConfig {
    pub weights: WeightTable,

    /// Intensity whose log exposure is pinned (to 0, or to 1.0 before
    /// taking the log for Robertson).
    pub anchor: usize,

    /// Debevec smoothness regularization weight (lambda).
    pub smoothness: f64,

    /// Maximum (width, height) of the images fed to the least-squares
    /// estimators.  Larger images are resampled down to this.
    pub sample_grid: (usize, usize),

    pub robertson: RobertsonConfig,
    pub mitsunaga: MitsunagaConfig,
}

impl Default for ResponseConfig {
    fn default() -> ResponseConfig {
        ResponseConfig {
            weights: WeightTable::hat(),
            anchor: 127,
            smoothness: 50.0,
            sample_grid: (25, 25),
            robertson: RobertsonConfig::default(),
            mitsunaga: MitsunagaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RobertsonConfig {
    /// Number of irradiance/curve alternations.  Always run in full.
    pub epochs: usize,

    /// Sigma (in intensity steps) of the Gaussian applied to the final
    /// log curve.
    pub smoothing_sigma: f64,
}

impl Default for RobertsonConfig {
    fn default() -> RobertsonConfig {
        RobertsonConfig {
            epochs: 5,
            smoothing_sigma: 4.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MitsunagaConfig {
    /// Candidate polynomial degrees.
    pub degrees: RangeInclusive<usize>,
    pub max_iterations: usize,

    /// Coefficient change below which ratio refinement stops.
    pub tolerance: f64,

    /// Only candidates whose fit error is strictly above this are
    /// eligible for selection.
    pub error_floor: f64,

    /// Value of the inverse response at full scale, `f(1.0)`.
    pub i_max: f64,

    /// Estimator whose curve range the final curve is rescaled to.
    pub reference: ReferenceMethod,
}

impl Default for MitsunagaConfig {
    fn default() -> MitsunagaConfig {
        MitsunagaConfig {
            degrees: 7..=10,
            max_iterations: 55,
            tolerance: 1.0e-4,
            error_floor: 100.0,
            i_max: 1.0,
            reference: ReferenceMethod::Debevec,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMethod {
    Debevec,
    Robertson,
}

impl std::str::FromStr for ReferenceMethod {
    type Err = crate::EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debevec" => Ok(ReferenceMethod::Debevec),
            "robertson" => Ok(ReferenceMethod::Robertson),
            _ => Err(crate::EstimateError::UnknownMethod(s.to_string())),
        }
    }
}
