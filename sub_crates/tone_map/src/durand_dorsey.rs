//! Durand & Dorsey local operator.
//!
//! Log luminance is split into a base layer (bilateral-filtered) and a
//! detail layer.  Only the base layer's contrast is compressed, by
//! `gamma`, so local detail survives.

use hdr::RadianceImage;

use crate::{
    bilateral_grid,
    transfer::{luminance, srgb_22, to_display_byte},
};

/// Keeps the log of black pixels finite.
const LUMINANCE_EPSILON: f32 = 1.0e-6;

/// Lower bound for the range sigma, for flat images.
const MIN_SIGMA_R: f32 = 1.0e-3;

pub fn map(image: &RadianceImage, gamma: f32) -> Vec<[u8; 3]> {
    let (width, height) = (image.width, image.height);

    let max = image
        .pixels
        .iter()
        .flat_map(|p| p.iter())
        .fold(0.0f32, |a, &b| a.max(b));
    let norm = if max > 0.0 { 1.0 / max } else { 1.0 };
    let normalized: Vec<[f32; 3]> = image
        .pixels
        .iter()
        .map(|p| [p[0] * norm, p[1] * norm, p[2] * norm])
        .collect();

    let lum: Vec<f32> = normalized
        .iter()
        .map(|&p| luminance(p) + LUMINANCE_EPSILON)
        .collect();
    let log_lum: Vec<f32> = lum.iter().map(|l| l.ln()).collect();

    let (lo, hi) = log_lum
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let sigma_s = width.min(height) as f32 / 16.0;
    let sigma_r = ((hi - lo) / 10.0).max(MIN_SIGMA_R);

    let base = bilateral_grid::filter(&log_lum, &log_lum, width, height, sigma_s, sigma_r);

    normalized
        .iter()
        .zip(lum.iter())
        .zip(log_lum.iter().zip(base.iter()))
        .map(|((p, &l), (&log_l, &b))| {
            let detail = (gamma * b + (log_l - b)).exp();
            let scale = detail / l;
            let encode = |c: f32| to_display_byte(srgb_22::from_linear(c * scale));
            [encode(p[0]), encode(p[1]), encode(p[2])]
        })
        .collect()
}
