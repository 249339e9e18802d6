//! Reinhard-style global photographic operator.
//!
//! Every channel value is scaled so that the log-average of the image
//! maps to the key `a`, then compressed with
//! `Ld = Lm * (1 + Lm / Lwhite^2) / (1 + Lm)`, where `Lwhite` is the
//! largest scaled value.

use hdr::RadianceImage;

use crate::transfer::to_display_byte;

pub fn map(image: &RadianceImage, d: f32, a: f32) -> Vec<[u8; 3]> {
    let d = d as f64;
    let a = a as f64;
    let values = || image.pixels.iter().flat_map(|p| p.iter()).map(|&v| v as f64);

    let count = (image.pixels.len() * 3) as f64;
    let log_average = (values().map(|v| (d + v).ln()).sum::<f64>() / count).exp();
    let scale = a / log_average;

    let white = values().fold(0.0f64, f64::max) * scale;
    let white_sq_inv = if white > 0.0 {
        1.0 / (white * white)
    } else {
        0.0
    };

    let compress = |v: f32| {
        let lm = v as f64 * scale;
        let ld = lm * (1.0 + lm * white_sq_inv) / (1.0 + lm);
        to_display_byte(ld as f32)
    };

    image
        .pixels
        .iter()
        .map(|p| [compress(p[0]), compress(p[1]), compress(p[2])])
        .collect()
}
