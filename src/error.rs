use std::path::PathBuf;

use sensor_analysis::EstimateError;
use thiserror::Error;
use tone_map::ToneMapError;

/// Coarse classification of `Error`, for deciding whether fixing the
/// input (and retrying) could help.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or inconsistent input data.
    Input,

    /// A numerical procedure failed or degenerated on otherwise valid
    /// input.
    Numerical,

    /// A feature or operator that isn't available.
    Unsupported,

    /// File system or stream failure.
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{path}:{line}: {reason}")]
    Manifest {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Exposure list not found: {0}")]
    MissingManifest(PathBuf),

    #[error("No images to merge")]
    NoImages,

    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: image_fmt::ReadError,
    },

    #[error("Image {name} is {found:?}, expected {expected:?}")]
    DimensionMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Image {name} has invalid exposure time {exposure}")]
    InvalidExposure { name: String, exposure: f64 },

    #[error("Exposure time {0} appears more than once")]
    DuplicateExposure(f64),

    #[error("Got {found} log exposure times for {expected} exposures")]
    ExposureCount { expected: usize, found: usize },

    #[error("Channel {channel} has {found} values, expected {expected}")]
    ChannelLength {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Response estimation failed: {0}")]
    Estimate(#[from] EstimateError),

    #[error("Tone mapping failed: {0}")]
    ToneMap(#[from] ToneMapError),

    #[error("Failed to write image: {0}")]
    ImageWrite(#[from] image_fmt::WriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Manifest { .. }
            | Error::MissingManifest(_)
            | Error::NoImages
            | Error::DimensionMismatch { .. }
            | Error::InvalidExposure { .. }
            | Error::DuplicateExposure(_)
            | Error::ExposureCount { .. }
            | Error::ChannelLength { .. } => ErrorKind::Input,

            Error::ImageLoad { source, .. } => match source {
                image_fmt::ReadError::IO(_) => ErrorKind::Io,
                image_fmt::ReadError::UnknownFormat
                | image_fmt::ReadError::UnsupportedFeature(_) => ErrorKind::Unsupported,
                _ => ErrorKind::Input,
            },

            Error::Estimate(e) => match e {
                EstimateError::DegenerateAnchor { .. }
                | EstimateError::Solver(_)
                | EstimateError::NoDegreeAboveFloor { .. }
                | EstimateError::Resample(_) => ErrorKind::Numerical,
                _ => ErrorKind::Input,
            },

            Error::ToneMap(e) => match e {
                ToneMapError::Unavailable(_) | ToneMapError::External(_) => {
                    ErrorKind::Unsupported
                }
                _ => ErrorKind::Input,
            },

            Error::ImageWrite(image_fmt::WriteError::IO(_)) | Error::Io(_) => ErrorKind::Io,
            Error::ImageWrite(_) => ErrorKind::Input,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::NoImages.kind(), ErrorKind::Input);
        assert_eq!(
            Error::ExposureCount {
                expected: 3,
                found: 2
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(
            Error::ChannelLength {
                channel: 2,
                expected: 4,
                found: 3
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(
            Error::from(EstimateError::NoDegreeAboveFloor {
                floor: 100.0,
                errors: vec![(7, 1.0)],
            })
            .kind(),
            ErrorKind::Numerical
        );
        assert_eq!(
            Error::from(EstimateError::NoUsableSamples).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            Error::from(ToneMapError::Unavailable("Drago")).kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk")).kind(),
            ErrorKind::Io
        );
        assert_eq!(
            Error::ImageLoad {
                path: "a.png".into(),
                source: image_fmt::ReadError::UnknownFormat,
            }
            .kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn channel_length_message() {
        let e = Error::ChannelLength {
            channel: 2,
            expected: 4,
            found: 3,
        };
        assert_eq!(e.to_string(), "Channel 2 has 3 values, expected 4");
    }

    #[test]
    fn manifest_message_names_line() {
        let e = Error::Manifest {
            path: "shots/image_list.txt".into(),
            line: 3,
            reason: "expected 2 fields, found 1".into(),
        };
        assert_eq!(
            e.to_string(),
            "shots/image_list.txt:3: expected 2 fields, found 1"
        );
    }
}
