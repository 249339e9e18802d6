use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    #[error("no exposure samples were given")]
    Empty,

    #[error("sample {index} is {found:?} pixels, but the first sample is {expected:?}")]
    DimensionMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("sample {index} has invalid exposure duration {exposure}")]
    InvalidExposure { index: usize, exposure: f64 },

    #[error("exposure duration {0} appears more than once")]
    DuplicateExposure(f64),

    #[error("{method} needs at least {needed} exposures, got {found}")]
    TooFewExposures {
        method: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("every sampled pixel has zero weight (all clipped or crushed)")]
    NoUsableSamples,

    #[error("response at anchor intensity {anchor} is {value}, cannot normalize")]
    DegenerateAnchor { anchor: usize, value: f64 },

    #[error("least-squares solve failed: {0}")]
    Solver(String),

    #[error("no polynomial degree has a fit error above {floor} (candidates: {errors:?})")]
    NoDegreeAboveFloor { floor: f64, errors: Vec<(usize, f64)> },

    #[error("unknown response curve method \"{0}\"")]
    UnknownMethod(String),

    #[error("failed to resample exposure: {0}")]
    Resample(String),
}

pub type Result<T> = std::result::Result<T, EstimateError>;
