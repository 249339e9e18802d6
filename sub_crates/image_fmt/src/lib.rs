//! Loading of 8/16-bit RGB images (PNG, JPEG, TIFF) and writing of 8-bit
//! PNGs.
//!
//! Alpha channels are dropped and grayscale is expanded to RGB, so every
//! loaded image is plain RGB.

mod error;
mod jpeg_fmt;
pub mod png_fmt;
mod tiff_fmt;

use std::io::{Read, Seek, SeekFrom};

pub use error::{ReadError, WriteError};

#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// 8-bit unsigned RGB channels.
    Rgb8(Vec<[u8; 3]>),

    /// 16-bit unsigned RGB channels.
    Rgb16(Vec<[u16; 3]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// (width, height)
    pub dimensions: (usize, usize),
    pub data: ImageData,
}

impl Image {
    pub fn pixel_count(&self) -> usize {
        self.dimensions.0 * self.dimensions.1
    }

    /// The pixels as 8-bit RGB.  16-bit channels keep their high byte.
    pub fn to_rgb8(&self) -> Vec<[u8; 3]> {
        match self.data {
            ImageData::Rgb8(ref pixels) => pixels.clone(),
            ImageData::Rgb16(ref pixels) => pixels
                .iter()
                .map(|p| [(p[0] >> 8) as u8, (p[1] >> 8) as u8, (p[2] >> 8) as u8])
                .collect(),
        }
    }

    pub fn is_16_bit(&self) -> bool {
        matches!(self.data, ImageData::Rgb16(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Format {
    Png,
    Jpeg,
    Tiff,
}

fn sniff(magic: &[u8]) -> Option<Format> {
    if magic.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n']) {
        Some(Format::Png)
    } else if magic.starts_with(&[0xFF, 0xD8]) {
        Some(Format::Jpeg)
    } else if magic.starts_with(b"II*\0") || magic.starts_with(b"MM\0*") {
        Some(Format::Tiff)
    } else {
        None
    }
}

/// Loads an image, determining its format from its first bytes.
pub fn load<R: Read + Seek>(mut reader: R) -> Result<Image, ReadError> {
    let start = reader.stream_position()?;
    let mut magic = Vec::with_capacity(8);
    reader.by_ref().take(8).read_to_end(&mut magic)?;
    reader.seek(SeekFrom::Start(start))?;

    match sniff(&magic) {
        Some(Format::Png) => png_fmt::load(reader),
        Some(Format::Jpeg) => jpeg_fmt::load(reader),
        Some(Format::Tiff) => tiff_fmt::load(reader),

        // No formats matched.
        None => Err(ReadError::UnknownFormat),
    }
}

/// Expands single-channel values to RGB.
fn gray_to_rgb<T: Copy>(data: &[T]) -> Vec<[T; 3]> {
    data.iter().map(|&c| [c, c, c]).collect()
}

/// Groups interleaved channels into RGB pixels, dropping any channels
/// past the third.
fn to_rgb<T: Copy>(data: &[T], channels: usize) -> Vec<[T; 3]> {
    data.chunks_exact(channels)
        .map(|c| match channels {
            1 | 2 => [c[0], c[0], c[0]],
            _ => [c[0], c[1], c[2]],
        })
        .collect()
}
