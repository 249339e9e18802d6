use std::io::Read;

use crate::{error::ReadError, gray_to_rgb, to_rgb, Image, ImageData};

pub fn load<R: Read>(mut reader: R) -> Result<Image, ReadError> {
    let mut decoder = jpeg_decoder::Decoder::new(&mut reader);
    let pixel_data = decoder.decode()?;

    let info = decoder
        .info()
        .ok_or_else(|| ReadError::Decode("missing frame header".into()))?;
    let dimensions = (info.width as usize, info.height as usize);
    let pixel_count = dimensions.0 * dimensions.1;

    use jpeg_decoder::PixelFormat::*;
    let data = match info.pixel_format {
        //------
        // RGB.
        RGB24 if pixel_data.len() == pixel_count * 3 => {
            ImageData::Rgb8(to_rgb(&pixel_data, 3))
        }

        //------------
        // Grayscale.
        L8 if pixel_data.len() == pixel_count => ImageData::Rgb8(gray_to_rgb(&pixel_data)),
        L16 if pixel_data.len() == pixel_count * 2 => {
            // NOTE: jpeg-decode doesn't document the endianness of
            // their 16-bit buffers, but examining the code in that
            // crate indicates that it's native endian.
            let values: Vec<u16> = pixel_data
                .chunks_exact(2)
                .map(|c| u16::from_ne_bytes([c[0], c[1]]))
                .collect();
            ImageData::Rgb16(gray_to_rgb(&values))
        }

        RGB24 | L8 | L16 => {
            return Err(ReadError::Decode(format!(
                "{} bytes of pixel data for a {}x{} image",
                pixel_data.len(),
                dimensions.0,
                dimensions.1
            )))
        }
        format => {
            return Err(ReadError::UnsupportedFeature(format!(
                "{:?} pixel format",
                format
            )))
        }
    };

    Ok(Image {
        dimensions: dimensions,
        data: data,
    })
}
