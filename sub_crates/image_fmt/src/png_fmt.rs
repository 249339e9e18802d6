use std::io::{Read, Write};

use crate::{
    error::{ReadError, WriteError},
    gray_to_rgb, to_rgb, Image, ImageData,
};

pub fn load<R: Read>(mut reader: R) -> Result<Image, ReadError> {
    let mut decoder = png::Decoder::new_with_limits(
        &mut reader,
        png::Limits {
            bytes: std::usize::MAX,
        },
    );
    // Palettes and sub-8-bit grayscale become plain 8-bit channels.
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info()?;

    let mut pixel_data = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixel_data)?;
    pixel_data.truncate(info.buffer_size());

    let dimensions = (info.width as usize, info.height as usize);
    let channels = info.color_type.samples();

    use png::BitDepth::*;
    let data = match info.bit_depth {
        Eight => ImageData::Rgb8(match channels {
            1 => gray_to_rgb(&pixel_data),
            n => to_rgb(&pixel_data, n),
        }),
        Sixteen => {
            let values: Vec<u16> = pixel_data
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            ImageData::Rgb16(match channels {
                1 => gray_to_rgb(&values),
                n => to_rgb(&values, n),
            })
        }
        depth => {
            return Err(ReadError::UnsupportedFeature(format!(
                "{:?} bit depth",
                depth
            )))
        }
    };

    Ok(Image {
        dimensions: dimensions,
        data: data,
    })
}

/// Writes an 8-bit RGB PNG.
pub fn save<W: Write>(
    writer: W,
    width: usize,
    height: usize,
    pixels: &[[u8; 3]],
) -> Result<(), WriteError> {
    if pixels.len() != width * height {
        return Err(WriteError::InvalidInput(format!(
            "{} pixels given for a {}x{} image",
            pixels.len(),
            width,
            height
        )));
    }

    let mut encoder = png::Encoder::new(writer, width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut png_writer = encoder.write_header()?;
    let bytes: Vec<u8> = pixels.iter().flat_map(|p| p.iter().copied()).collect();
    png_writer.write_image_data(&bytes)?;
    png_writer.finish()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn save_then_load() {
        let pixels: Vec<[u8; 3]> = (0..6u8).map(|i| [i, i * 10, 255 - i]).collect();
        let mut bytes = Vec::new();
        save(&mut bytes, 3, 2, &pixels).unwrap();

        let image = crate::load(Cursor::new(bytes)).unwrap();
        assert_eq!(image.dimensions, (3, 2));
        assert_eq!(image.data, ImageData::Rgb8(pixels));
    }

    #[test]
    fn grayscale_expands_to_rgb() {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, 2, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[10, 200]).unwrap();
        }

        let image = load(Cursor::new(bytes)).unwrap();
        assert_eq!(image.data, ImageData::Rgb8(vec![[10, 10, 10], [200, 200, 200]]));
    }

    #[test]
    fn sixteen_bit_rgba() {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, 1, 1);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Sixteen);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&[0x12, 0x34, 0x00, 0x01, 0xFF, 0xFF, 0xAB, 0xCD])
                .unwrap();
        }

        let image = load(Cursor::new(bytes)).unwrap();
        assert_eq!(image.data, ImageData::Rgb16(vec![[0x1234, 0x0001, 0xFFFF]]));
        assert_eq!(image.to_rgb8(), vec![[0x12, 0x00, 0xFF]]);
    }

    #[test]
    fn save_rejects_wrong_pixel_count() {
        let mut bytes = Vec::new();
        assert!(matches!(
            save(&mut bytes, 2, 2, &[[0, 0, 0]; 3]),
            Err(WriteError::InvalidInput(_))
        ));
    }
}
