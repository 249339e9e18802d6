//! Merging of a bracketed exposure set into a single radiance image.

use hdr::RadianceImage;
use sensor_analysis::{ExposureSample, ResponseCurve, WeightTable};
use tracing::warn;

use crate::{progress::Progress, Error, Result};

/// Computes the log radiance of every pixel of one color channel.
///
/// Each pixel is the weighted mean of `curve[z] - ln_t` over the
/// exposures.  Pixels where every exposure has zero weight (clipped or
/// crushed in all of them) come out as exactly 0.
pub fn fuse_channel(
    curve: &ResponseCurve,
    samples: &[ExposureSample],
    ln_t: &[f64],
    weights: &WeightTable,
    progress: &mut dyn Progress,
) -> Result<Vec<f32>> {
    let first = samples.first().ok_or(Error::NoImages)?;
    let (width, height) = first.dimensions();
    if ln_t.len() != samples.len() {
        return Err(Error::ExposureCount {
            expected: samples.len(),
            found: ln_t.len(),
        });
    }
    for (i, sample) in samples.iter().enumerate() {
        if sample.dimensions() != (width, height) || sample.pixels.len() != width * height {
            return Err(Error::DimensionMismatch {
                name: format!("#{}", i),
                expected: (width, height),
                found: sample.dimensions(),
            });
        }
    }

    let mut ln_radiance = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let mut sum = 0.0f64;
            let mut weight_sum = 0.0f64;
            for (sample, &lt) in samples.iter().zip(ln_t.iter()) {
                let z = sample.pixels[i];
                let w = weights[z];
                sum += w * (curve[z] - lt);
                weight_sum += w;
            }
            ln_radiance.push(if weight_sum > 0.0 {
                (sum / weight_sum) as f32
            } else {
                0.0
            });
        }
        progress.set_progress(
            format!("Fusing row {} of {}", y + 1, height),
            (y + 1) as f32 / height as f32,
        );
    }

    Ok(ln_radiance)
}

/// Exponentiates three log-radiance channels into an RGB radiance image.
///
/// Non-finite results are replaced (see `RadianceImage::sanitize()`).
pub fn assemble(
    ln_r: &[f32],
    ln_g: &[f32],
    ln_b: &[f32],
    width: usize,
    height: usize,
) -> Result<RadianceImage> {
    let pixel_count = width * height;
    if pixel_count == 0 {
        return Err(Error::NoImages);
    }
    for (chan, len) in [ln_r.len(), ln_g.len(), ln_b.len()].iter().enumerate() {
        if *len != pixel_count {
            return Err(Error::ChannelLength {
                channel: chan,
                expected: pixel_count,
                found: *len,
            });
        }
    }

    let pixels = ln_r
        .iter()
        .zip(ln_g.iter())
        .zip(ln_b.iter())
        .map(|((r, g), b)| [r.exp(), g.exp(), b.exp()])
        .collect();
    let mut image = RadianceImage::new(width, height, pixels);

    let replaced = image.sanitize();
    if replaced > 0 {
        warn!(replaced, "Replaced non-finite values in the radiance image");
    }

    Ok(image)
}
