//! Encoding/decoding for RGBE pixels.
//!
//! The encoding uses 8 bits of mantissa per channel, and 8 bits for the
//! shared exponent.  The byte layout is [R mantissa, G mantissa, B mantissa,
//! exponent].  The exponent is stored as an unsigned integer with a bias of
//! 128, and a mantissa byte `c` with exponent byte `E` represents
//! `c * 2^(E - 136)`.
//!
//! This is the pixel format of the Radiance .hdr image file format.

const EXP_BIAS: i32 = 128;

/// Splits a positive, normal float into `(m, e)` with `n = m * 2^e` and
/// `m` in [0.5, 1).
///
/// Uses IEEE bit fiddling, so it is only correct for normal numbers.
#[inline(always)]
fn frexp(n: f32) -> (f32, i32) {
    let bits = n.to_bits();
    let e = ((bits >> 23) & 0b1111_1111) as i32 - 126;
    let m = f32::from_bits((bits & !(0b1111_1111 << 23)) | (126 << 23));
    (m, e)
}

/// Encodes three floating point values into an RGBE pixel.
///
/// Each mantissa is rounded to the nearest representable step and clamped
/// to 255.  Pixels whose brightest channel is zero (or too small to be a
/// normal float) encode as all zeros.
///
/// Warning: negative values and NaN's are _not_ supported by the RGBE
/// format.  There are debug-only assertions in place to catch such values
/// in the input floats.
#[inline]
pub fn encode(floats: [f32; 3]) -> [u8; 4] {
    debug_assert!(
        floats[0] >= 0.0
            && floats[1] >= 0.0
            && floats[2] >= 0.0
            && !floats[0].is_nan()
            && !floats[1].is_nan()
            && !floats[2].is_nan(),
        "rgbe::encode(): encoding to RGBE only works correctly for \
         positive, non-NaN numbers, but the numbers passed were: ({}, {}, {})",
        floats[0],
        floats[1],
        floats[2]
    );

    let brightest = floats[0].max(floats[1].max(floats[2]));
    if !(brightest >= f32::MIN_POSITIVE) {
        return [0, 0, 0, 0];
    }

    let (_, e) = frexp(brightest);
    // The exponent byte tops out at 255, i.e. e = 127.
    let e = e.min(255 - EXP_BIAS);

    // m * 256 / brightest == 2^(8 - e).  Done in f64 since the scale can
    // leave the f32 range for large exponents.
    let scale = 2.0f64.powi(8 - e);
    let mantissa = |c: f32| (c as f64 * scale).round().min(255.0) as u8;

    [
        mantissa(floats[0]),
        mantissa(floats[1]),
        mantissa(floats[2]),
        (e + EXP_BIAS) as u8,
    ]
}

/// Decodes an RGBE pixel into three full floating point numbers.
///
/// A zero exponent byte decodes to black.
#[inline]
pub fn decode(rgbe: [u8; 4]) -> [f32; 3] {
    if rgbe[3] == 0 {
        return [0.0, 0.0, 0.0];
    }

    let multiplier = 2.0f64.powi(rgbe[3] as i32 - EXP_BIAS - 8);

    [
        (rgbe[0] as f64 * multiplier) as f32,
        (rgbe[1] as f64 * multiplier) as f32,
        (rgbe[2] as f64 * multiplier) as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(floats: [f32; 3]) -> [f32; 3] {
        decode(encode(floats))
    }

    #[test]
    fn frexp_matches_definition() {
        assert_eq!(frexp(1.0), (0.5, 1));
        assert_eq!(frexp(0.75), (0.75, 0));
        assert_eq!(frexp(64.0), (0.5, 7));
        assert_eq!(frexp(3.0), (0.75, 2));
    }

    #[test]
    fn all_zeros() {
        let fs = [0.0f32, 0.0f32, 0.0f32];

        let rgbe = encode(fs);
        let fs2 = decode(rgbe);

        assert_eq!(rgbe, [0, 0, 0, 0]);
        assert_eq!(fs, fs2);
    }

    #[test]
    fn subnormal_is_black() {
        assert_eq!(encode([1.0e-40, 0.0, 0.0]), [0, 0, 0, 0]);
    }

    #[test]
    fn known_bytes() {
        assert_eq!(encode([1.0, 0.5, 0.25]), [128, 64, 32, 129]);
        assert_eq!(encode([0.0, 0.0, 255.0]), [0, 0, 255, 136]);
    }

    #[test]
    fn powers_of_two() {
        let fs = [8.0f32, 64.0f32, 0.5f32];
        assert_eq!(fs, round_trip(fs));
    }

    #[test]
    fn accuracy_01() {
        let mut n = 1.0;
        for _ in 0..128 {
            let [x, _, _] = round_trip([n, 0.0, 0.0]);
            assert_eq!(n, x);
            n += 1.0 / 128.0;
        }
    }

    #[test]
    #[should_panic]
    fn accuracy_02() {
        let mut n = 1.0;
        for _ in 0..256 {
            let [x, _, _] = round_trip([n, 0.0, 0.0]);
            assert_eq!(n, x);
            n += 1.0 / 256.0;
        }
    }

    #[test]
    fn integers() {
        for n in 0..=256 {
            let [x, _, _] = round_trip([n as f32, 0.0, 0.0]);
            assert_eq!(n as f32, x);
        }
    }

    #[test]
    fn precision_rounds() {
        let fs = [7.0f32, 257.0f32, 1.0f32];
        assert_eq!([8.0, 258.0, 2.0], round_trip(fs));
    }

    #[test]
    fn error_within_one_step() {
        let mut n = 1.0e-6f32;
        while n < 1.0e6 {
            let fs = [n, n * 0.37, n * 0.011];
            let (_, e) = frexp(n);
            let step = 2.0f32.powi(e) / 256.0;
            let decoded = round_trip(fs);
            for c in 0..3 {
                assert!(
                    (decoded[c] - fs[c]).abs() <= step,
                    "{} decoded as {}",
                    fs[c],
                    decoded[c]
                );
            }
            n *= 1.7;
        }
    }

    #[test]
    fn mantissa_clamps_at_255() {
        // Rounds up to 256 without the clamp.
        let rgbe = encode([0.99999, 0.0, 0.0]);
        assert_eq!(rgbe, [255, 0, 0, 128]);
    }

    #[test]
    fn exponent_clamps() {
        assert_eq!(encode([f32::MAX, 0.0, 0.0]), [255, 0, 0, 255]);
    }

    #[test]
    #[should_panic]
    fn nans_01() {
        encode([std::f32::NAN, 0.0, 0.0]);
    }

    #[test]
    #[should_panic]
    fn nans_02() {
        encode([0.0, std::f32::NAN, 0.0]);
    }

    #[test]
    #[should_panic]
    fn negative_01() {
        encode([-1.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic]
    fn negative_02() {
        encode([0.0, 0.0, -1.0]);
    }

    #[test]
    fn negative_zero() {
        assert_eq!(encode([-0.0, -0.0, -0.0]), [0, 0, 0, 0]);
    }
}
