//! Radiance maps and the Radiance `.hdr` (RGBE) file format.

pub mod rgbe;

use std::io::{BufRead, Read, Write};

/// A linear-light RGB image.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianceImage {
    pub width: usize,
    pub height: usize,

    /// Row-major, top row first, in R,G,B order.
    pub pixels: Vec<[f32; 3]>,
}

impl RadianceImage {
    pub fn new(width: usize, height: usize, pixels: Vec<[f32; 3]>) -> RadianceImage {
        debug_assert_eq!(pixels.len(), width * height);
        RadianceImage {
            width: width,
            height: height,
            pixels: pixels,
        }
    }

    /// Largest finite channel value, if there is one.
    pub fn max_finite(&self) -> Option<f32> {
        self.pixels
            .iter()
            .flat_map(|p| p.iter())
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |a| a.max(v))))
    }

    /// Replaces values that can't be displayed or encoded.
    ///
    /// NaN and negative values become 0, and +inf becomes the largest
    /// finite value in the image (or 0 if there is none).  Returns the
    /// number of channel values that were replaced.
    pub fn sanitize(&mut self) -> usize {
        let ceiling = self.max_finite().unwrap_or(0.0).max(0.0);
        let mut replaced = 0;
        for v in self.pixels.iter_mut().flat_map(|p| p.iter_mut()) {
            let fixed = if v.is_nan() || *v < 0.0 {
                0.0
            } else if v.is_infinite() {
                ceiling
            } else {
                continue;
            };
            *v = fixed;
            replaced += 1;
        }
        replaced
    }

    pub fn write_hdr<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write_hdr(out, &self.pixels, self.width, self.height)
    }
}

/// Writes a Radiance `.hdr` file with flat (non-run-length-encoded)
/// scanlines.
///
/// `image` is row-major, top row first, in R,G,B order.
pub fn write_hdr<W: Write>(
    out: &mut W,
    image: &[[f32; 3]],
    width: usize,
    height: usize,
) -> std::io::Result<()> {
    if image.len() != width * height {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "image has {} pixels, but {}x{} were specified",
                image.len(),
                width,
                height
            ),
        ));
    }

    out.write_all(b"#?RADIANCE\n")?;
    out.write_all(b"FORMAT=32-bit_rle_rgbe\n\n")?;
    out.write_all(format!("-Y {} +X {}\n", height, width).as_bytes())?;
    for pixel in image.iter() {
        out.write_all(&rgbe::encode(*pixel))?;
    }
    out.flush()?;

    Ok(())
}

/// Reads a Radiance `.hdr` file with flat scanlines.
pub fn read_hdr<R: BufRead>(input: &mut R) -> Result<RadianceImage, ReadError> {
    let magic = read_line(input)?;
    if magic != "#?RADIANCE" && magic != "#?RGBE" {
        return Err(ReadError::BadMagic);
    }

    // Header variables, up to the blank line.
    loop {
        let line = read_line(input)?;
        if line.is_empty() {
            break;
        }
        if let Some(format) = line.strip_prefix("FORMAT=") {
            if format.trim() != "32-bit_rle_rgbe" {
                return Err(ReadError::UnsupportedFeature(format!(
                    "pixel format '{}'",
                    format.trim()
                )));
            }
        }
        // Comments and other variables (EXPOSURE, GAMMA, ...) are ignored.
    }

    let resolution = read_line(input)?;
    let (width, height) = parse_resolution(&resolution)?;

    // Buffers grow with the data actually read, not with the resolution
    // the header claims.
    let scanline_len = width
        .checked_mul(4)
        .filter(|_| width.checked_mul(height).is_some())
        .ok_or_else(|| ReadError::BadResolution(resolution.clone()))?;
    let mut pixels = Vec::new();
    let mut scanline = Vec::new();
    let rows = if width == 0 { 0 } else { height };
    for _ in 0..rows {
        if scanline.is_empty() {
            input
                .by_ref()
                .take(scanline_len as u64)
                .read_to_end(&mut scanline)?;
            if scanline.len() != scanline_len {
                return Err(ReadError::IO(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "unexpected end of pixel data",
                )));
            }
        } else {
            input.read_exact(&mut scanline)?;
        }
        if is_rle_scanline(&scanline, width) {
            return Err(ReadError::UnsupportedFeature(
                "run-length encoded scanlines".into(),
            ));
        }
        pixels.extend(
            scanline
                .chunks_exact(4)
                .map(|c| rgbe::decode([c[0], c[1], c[2], c[3]])),
        );
    }

    Ok(RadianceImage::new(width, height, pixels))
}

/// Reads one `\n`-terminated header line, without the terminator.
fn read_line<R: BufRead>(input: &mut R) -> Result<String, ReadError> {
    let mut buf = Vec::new();
    let n = input.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Err(ReadError::IO(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "unexpected end of header",
        )));
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Only the standard `-Y <height> +X <width>` orientation is supported.
fn parse_resolution(line: &str) -> Result<(usize, usize), ReadError> {
    let bad = || ReadError::BadResolution(line.to_string());
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields[..] {
        ["-Y", h, "+X", w] => {
            let height = h.parse::<usize>().map_err(|_| bad())?;
            let width = w.parse::<usize>().map_err(|_| bad())?;
            Ok((width, height))
        }
        _ => Err(bad()),
    }
}

/// New-style RLE scanlines start with `2, 2` followed by the big-endian
/// scanline width.
fn is_rle_scanline(scanline: &[u8], width: usize) -> bool {
    (8..0x8000).contains(&width)
        && scanline[0] == 2
        && scanline[1] == 2
        && ((scanline[2] as usize) << 8 | scanline[3] as usize) == width
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("not a Radiance file")]
    BadMagic,

    #[error("unsupported resolution line '{0}'")]
    BadResolution(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(image: &RadianceImage) -> Vec<u8> {
        let mut out = Vec::new();
        image.write_hdr(&mut out).unwrap();
        out
    }

    #[test]
    fn header_is_exact() {
        let image = RadianceImage::new(3, 2, vec![[1.0, 0.5, 0.25]; 6]);
        let bytes = write(&image);

        let header = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2 +X 3\n";
        assert_eq!(&bytes[..header.len()], &header[..]);
        assert_eq!(bytes.len(), header.len() + 6 * 4);
        assert_eq!(&bytes[header.len()..header.len() + 4], &[128, 64, 32, 129]);
    }

    #[test]
    fn pixel_count_mismatch() {
        let mut out = Vec::new();
        let err = write_hdr(&mut out, &[[0.0; 3]; 5], 3, 2).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn scanlines_are_row_major() {
        // Distinct red value per pixel, to check ordering.
        let pixels: Vec<[f32; 3]> = (1..=6).map(|i| [i as f32, 0.0, 0.0]).collect();
        let image = RadianceImage::new(3, 2, pixels);
        let read = read_hdr(&mut &write(&image)[..]).unwrap();

        assert_eq!((read.width, read.height), (3, 2));
        assert_eq!(read.pixels, image.pixels);
    }

    #[test]
    fn read_back_within_precision() {
        let pixels: Vec<[f32; 3]> = (0..64)
            .map(|i| {
                let v = 0.001 * 1.3f32.powi(i);
                [v, v * 0.5, v * 0.9]
            })
            .collect();
        let image = RadianceImage::new(8, 8, pixels);
        let read = read_hdr(&mut &write(&image)[..]).unwrap();

        for (a, b) in image.pixels.iter().zip(read.pixels.iter()) {
            for c in 0..3 {
                assert!((a[c] - b[c]).abs() <= a[0] / 128.0);
            }
        }
    }

    #[test]
    fn reads_comments_and_rgbe_magic() {
        let mut data = b"#?RGBE\n# made by hand\nEXPOSURE=1.0\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 1\n".to_vec();
        data.extend_from_slice(&[128, 64, 32, 129]);
        let read = read_hdr(&mut &data[..]).unwrap();
        assert_eq!(read.pixels, vec![[1.0, 0.5, 0.25]]);
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(
            read_hdr(&mut &b"P6\n"[..]),
            Err(ReadError::BadMagic)
        ));
        assert!(matches!(
            read_hdr(&mut &b"#?RADIANCE\nFORMAT=32-bit_rle_xyze\n\n-Y 1 +X 1\n"[..]),
            Err(ReadError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            read_hdr(&mut &b"#?RADIANCE\n\n+Y 1 +X 1\n"[..]),
            Err(ReadError::BadResolution(_))
        ));
        assert!(matches!(
            read_hdr(&mut &b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n"[..]),
            Err(ReadError::IO(_))
        ));
    }

    #[test]
    fn rejects_rle() {
        let mut data = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 8\n".to_vec();
        data.extend_from_slice(&[2, 2, 0, 8]);
        data.extend_from_slice(&[0; 28]);
        assert!(matches!(
            read_hdr(&mut &data[..]),
            Err(ReadError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn truncated_pixels() {
        let mut data = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2 +X 2\n".to_vec();
        data.extend_from_slice(&[128, 64, 32, 129]);
        assert!(matches!(read_hdr(&mut &data[..]), Err(ReadError::IO(_))));

        let empty = read_hdr(&mut &b"#?RADIANCE\n\n-Y 18446744073709551615 +X 0\n"[..]).unwrap();
        assert_eq!(empty.width, 0);
        assert!(empty.pixels.is_empty());
    }

    #[test]
    fn oversized_resolution() {
        assert!(matches!(
            read_hdr(&mut &b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 4294967296 +X 4294967296\n"[..]),
            Err(ReadError::BadResolution(_))
        ));
        let huge_width = format!("#?RADIANCE\n\n-Y 1 +X {}\n", usize::MAX / 2);
        assert!(matches!(
            read_hdr(&mut huge_width.as_bytes()),
            Err(ReadError::BadResolution(_))
        ));

        // Fits in memory arithmetic but not in the file: fails on the
        // missing data without reserving the whole image.
        let mut data = b"#?RADIANCE\n\n-Y 100000 +X 100000\n".to_vec();
        data.extend_from_slice(&[128, 64, 32, 129]);
        assert!(matches!(read_hdr(&mut &data[..]), Err(ReadError::IO(_))));

        let empty = read_hdr(&mut &b"#?RADIANCE\n\n-Y 18446744073709551615 +X 0\n"[..]).unwrap();
        assert_eq!(empty.width, 0);
        assert!(empty.pixels.is_empty());
    }

    #[test]
    fn sanitize_replaces_non_finite() {
        let mut image = RadianceImage::new(
            2,
            2,
            vec![
                [1.0, f32::NAN, 3.0],
                [f32::INFINITY, 0.5, f32::NEG_INFINITY],
                [-2.0, 0.0, 4.0],
                [0.25, 0.25, 0.25],
            ],
        );
        assert_eq!(image.sanitize(), 4);
        assert_eq!(
            image.pixels,
            vec![
                [1.0, 0.0, 3.0],
                [4.0, 0.5, 0.0],
                [0.0, 0.0, 4.0],
                [0.25, 0.25, 0.25],
            ]
        );
        assert_eq!(image.sanitize(), 0);
    }

    #[test]
    fn sanitize_all_infinite() {
        let mut image = RadianceImage::new(1, 1, vec![[f32::INFINITY; 3]]);
        assert_eq!(image.sanitize(), 3);
        assert_eq!(image.pixels, vec![[0.0; 3]]);
    }
}
