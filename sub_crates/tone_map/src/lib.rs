//! Tone mapping of linear radiance maps down to 8-bit display images.
//!
//! Two operators are implemented here: a global photographic operator and
//! the Durand & Dorsey local operator (built on `bilateral_grid`).  The
//! named operators in `ExternalOperator` come from an external library,
//! and are only available when the caller supplies an
//! `ExternalToneMapper`.

pub mod bilateral_grid;
mod durand_dorsey;
mod global;
pub mod transfer;

use hdr::RadianceImage;
use tracing::{debug, warn};

/// An 8-bit RGB image, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
}

/// Operators provided by an external tone-mapping library, with their
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExternalOperator {
    Drago {
        gamma: f32,
        saturation: f32,
    },
    Reinhard {
        gamma: f32,
        intensity: f32,
        light_adapt: f32,
        color_adapt: f32,
    },
    Mantiuk {
        gamma: f32,
        scale: f32,
        saturation: f32,
    },
}

impl ExternalOperator {
    pub const DRAGO: ExternalOperator = ExternalOperator::Drago {
        gamma: 1.0,
        saturation: 0.7,
    };
    pub const REINHARD: ExternalOperator = ExternalOperator::Reinhard {
        gamma: 1.5,
        intensity: 0.0,
        light_adapt: 0.0,
        color_adapt: 0.0,
    };
    pub const MANTIUK: ExternalOperator = ExternalOperator::Mantiuk {
        gamma: 2.2,
        scale: 0.85,
        saturation: 1.2,
    };

    pub fn name(&self) -> &'static str {
        match self {
            ExternalOperator::Drago { .. } => "Drago",
            ExternalOperator::Reinhard { .. } => "Reinhard",
            ExternalOperator::Mantiuk { .. } => "Mantiuk",
        }
    }
}

/// A source of the external named operators.
pub trait ExternalToneMapper {
    /// `radiance` has already been sanitized.  The result must have the
    /// same dimensions as `radiance`.
    fn map(
        &self,
        radiance: &RadianceImage,
        operator: &ExternalOperator,
    ) -> Result<DisplayImage, ToneMapError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneMapMethod {
    Global { d: f32, a: f32 },
    DurandDorsey { gamma: f32 },
    External(ExternalOperator),
}

impl ToneMapMethod {
    pub const GLOBAL: ToneMapMethod = ToneMapMethod::Global { d: 1.0e-5, a: 0.5 };
    pub const DURAND_DORSEY: ToneMapMethod = ToneMapMethod::DurandDorsey { gamma: 0.45 };

    /// Every method with default parameters, in the order they're run by
    /// default.
    pub const DEFAULT_SEQUENCE: [ToneMapMethod; 5] = [
        ToneMapMethod::External(ExternalOperator::REINHARD),
        ToneMapMethod::External(ExternalOperator::MANTIUK),
        ToneMapMethod::GLOBAL,
        ToneMapMethod::DURAND_DORSEY,
        ToneMapMethod::External(ExternalOperator::DRAGO),
    ];

    /// Name used on the command line and in output file names.
    pub fn name(&self) -> &'static str {
        match self {
            ToneMapMethod::Global { .. } => "global",
            ToneMapMethod::DurandDorsey { .. } => "durandanddorsy",
            ToneMapMethod::External(op) => op.name(),
        }
    }

    /// Tone maps `radiance` to an 8-bit display image.
    ///
    /// Works on a sanitized copy of the input.  External operators fail
    /// with `ToneMapError::Unavailable` when `external` is `None`.
    pub fn map(
        &self,
        radiance: &RadianceImage,
        external: Option<&dyn ExternalToneMapper>,
    ) -> Result<DisplayImage, ToneMapError> {
        if radiance.width == 0 || radiance.height == 0 {
            return Err(ToneMapError::EmptyImage);
        }
        if radiance.pixels.len() != radiance.width * radiance.height {
            return Err(ToneMapError::DimensionMismatch {
                pixels: radiance.pixels.len(),
                width: radiance.width,
                height: radiance.height,
            });
        }

        let mut input = radiance.clone();
        let replaced = input.sanitize();
        if replaced > 0 {
            warn!(
                method = self.name(),
                replaced, "Replaced non-finite radiance values before tone mapping"
            );
        }
        debug!(method = self.name(), "Tone mapping");

        let pixels = match self {
            ToneMapMethod::Global { d, a } => global::map(&input, *d, *a),
            ToneMapMethod::DurandDorsey { gamma } => durand_dorsey::map(&input, *gamma),
            ToneMapMethod::External(op) => {
                let mapper = external.ok_or(ToneMapError::Unavailable(self.name()))?;
                let image = mapper.map(&input, op)?;
                if (image.width, image.height) != (input.width, input.height)
                    || image.pixels.len() != input.pixels.len()
                {
                    return Err(ToneMapError::External(format!(
                        "{} returned a {}x{} image for a {}x{} input",
                        op.name(),
                        image.width,
                        image.height,
                        input.width,
                        input.height
                    )));
                }
                return Ok(image);
            }
        };

        Ok(DisplayImage {
            width: input.width,
            height: input.height,
            pixels: pixels,
        })
    }
}

impl std::fmt::Display for ToneMapMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ToneMapMethod {
    type Err = ToneMapError;

    /// Case-insensitive; gives the method with its default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToneMapMethod::DEFAULT_SEQUENCE
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ToneMapError::UnknownMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToneMapError {
    #[error("unknown tone mapping method '{0}'")]
    UnknownMethod(String),

    #[error("tone mapping method '{0}' is not available")]
    Unavailable(&'static str),

    #[error("cannot tone map an empty image")]
    EmptyImage,

    #[error("{pixels} pixels given for a {width}x{height} image")]
    DimensionMismatch {
        pixels: usize,
        width: usize,
        height: usize,
    },

    #[error("external tone mapper failed: {0}")]
    External(String),
}
