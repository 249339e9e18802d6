//! Reconstruction of HDR radiance maps from bracketed 8-bit exposures,
//! and tone mapping of the result back down for display.

pub mod error;
pub mod exposure;
pub mod logger;
pub mod merge;
pub mod pipeline;
pub mod progress;

use std::{fs::File, io::BufReader, path::Path};

use tracing::debug;

pub use error::{Error, ErrorKind, Result};

#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Row-major RGB.
    pub pixels: Vec<[u8; 3]>,
    pub info: ImageInfo,
}

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub filename: String,
    pub full_filepath: String,

    pub width: usize,
    pub height: usize,

    /// Exposure time in seconds.
    pub exposure: f64,

    /// Bit depth of the file.  Pixels are always 8-bit once loaded.
    pub bit_depth: usize,
}

impl SourceImage {
    pub fn dimensions(&self) -> (usize, usize) {
        (self.info.width, self.info.height)
    }

    /// One color channel (0 = red, 1 = green, 2 = blue).
    pub fn channel(&self, chan: usize) -> Vec<u8> {
        self.pixels.iter().map(|p| p[chan]).collect()
    }
}

/// Loads an image file, reducing it to 8 bits per channel if needed.
pub fn load_image(path: &Path, exposure: f64) -> Result<SourceImage> {
    let load_error = |source: image_fmt::ReadError| Error::ImageLoad {
        path: path.to_path_buf(),
        source: source,
    };
    let file = File::open(path).map_err(|e| load_error(e.into()))?;
    let img = image_fmt::load(BufReader::new(file)).map_err(load_error)?;

    let bit_depth = if img.is_16_bit() { 16 } else { 8 };
    if bit_depth != 8 {
        debug!(
            path = %path.display(),
            "Reducing {}-bit image to 8 bits", bit_depth
        );
    }

    Ok(SourceImage {
        pixels: img.to_rgb8(),
        info: ImageInfo {
            filename: path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            full_filepath: path.to_string_lossy().into_owned(),
            width: img.dimensions.0,
            height: img.dimensions.1,
            exposure: exposure,
            bit_depth: bit_depth,
        },
    })
}
