use std::num::NonZeroU32;

use fast_image_resize as fr;

use crate::error::{EstimateError, Result};

/// A single 8-bit channel of one exposure, with its exposure duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureSample {
    pub width: usize,
    pub height: usize,

    /// Row-major, `width * height` values.
    pub pixels: Vec<u8>,

    /// Exposure duration in seconds.
    pub exposure: f64,
}

impl ExposureSample {
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns a copy resampled to fit within `grid` (width, height).
    ///
    /// Samples that already fit are returned as-is.  Resampling is
    /// bilinear, and only ever shrinks.
    pub fn downsampled(&self, grid: (usize, usize)) -> Result<ExposureSample> {
        let new_width = self.width.min(grid.0.max(1));
        let new_height = self.height.min(grid.1.max(1));
        if (new_width, new_height) == (self.width, self.height) {
            return Ok(self.clone());
        }

        let dim = |n: usize| {
            NonZeroU32::new(n as u32)
                .ok_or_else(|| EstimateError::Resample(format!("zero-sized dimension {}", n)))
        };

        let src = fr::Image::from_vec_u8(
            dim(self.width)?,
            dim(self.height)?,
            self.pixels.clone(),
            fr::PixelType::U8,
        )
        .map_err(|e| EstimateError::Resample(e.to_string()))?;
        let mut dst = fr::Image::new(dim(new_width)?, dim(new_height)?, fr::PixelType::U8);

        let mut resizer = fr::Resizer::new(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
        resizer
            .resize(&src.view(), &mut dst.view_mut())
            .map_err(|e| EstimateError::Resample(e.to_string()))?;

        Ok(ExposureSample {
            width: new_width,
            height: new_height,
            pixels: dst.buffer().to_vec(),
            exposure: self.exposure,
        })
    }
}

/// Downsamples every sample to the configured grid.
pub(crate) fn downsample_all(
    samples: &[ExposureSample],
    grid: (usize, usize),
) -> Result<Vec<ExposureSample>> {
    samples.iter().map(|s| s.downsampled(grid)).collect()
}
