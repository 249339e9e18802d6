//! Luminance and display encoding.

/// Rec.601 luma weights, applied to linear RGB.
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

/// Scales a [0, 1] value to a display byte.  Out-of-range values (and
/// NaN) are clipped, and the fraction is truncated.
#[inline]
pub fn to_display_byte(n: f32) -> u8 {
    (n * 255.0).max(0.0).min(255.0) as u8
}

/// The sRGB piecewise curve, but with a plain 2.2 exponent on the power
/// segment instead of sRGB's 2.4.
pub mod srgb_22 {
    /// Linear -> display
    #[inline]
    pub fn from_linear(n: f32) -> f32 {
        if n <= 0.003_130_8 {
            n * 12.92
        } else {
            (1.055 * n.powf(1.0 / 2.2)) - 0.055
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_luminance() {
        assert!((luminance([0.5, 0.5, 0.5]) - 0.5).abs() < 1e-6);
        assert!((luminance([1.0, 0.0, 0.0]) - 0.299).abs() < 1e-6);
        assert!((luminance([0.0, 0.0, 1.0]) - 0.114).abs() < 1e-6);
    }

    #[test]
    fn display_byte_clips() {
        assert_eq!(to_display_byte(-1.0), 0);
        assert_eq!(to_display_byte(0.5), 127);
        assert_eq!(to_display_byte(1.0), 255);
        assert_eq!(to_display_byte(7.0), 255);
        assert_eq!(to_display_byte(f32::NAN), 0);
    }
}
