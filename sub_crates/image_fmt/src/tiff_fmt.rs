use std::io::{Read, Seek};

use tiff::{decoder::DecodingResult, ColorType};

use crate::{error::ReadError, to_rgb, Image, ImageData};

pub fn load<R: Read + Seek>(mut reader: R) -> Result<Image, ReadError> {
    let mut decoder =
        tiff::decoder::Decoder::new(&mut reader)?.with_limits(tiff::decoder::Limits::unlimited());

    let (width, height) = decoder.dimensions()?;
    let dimensions = (width as usize, height as usize);
    let channels = match decoder.colortype()? {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        other => {
            return Err(ReadError::UnsupportedFeature(format!(
                "{:?} color type",
                other
            )))
        }
    };

    let data = match decoder.read_image()? {
        DecodingResult::U8(pixel_data) => ImageData::Rgb8(to_rgb(&pixel_data, channels)),
        DecodingResult::U16(pixel_data) => ImageData::Rgb16(to_rgb(&pixel_data, channels)),
        _ => {
            return Err(ReadError::UnsupportedFeature(
                "sample format other than 8/16-bit unsigned".into(),
            ))
        }
    };

    Ok(Image {
        dimensions: dimensions,
        data: data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{colortype, TiffEncoder};

    #[test]
    fn non_square_rgb() {
        let mut bytes = Cursor::new(Vec::new());
        let data: Vec<u8> = (0..3 * 2 * 3).map(|i| i as u8).collect();
        TiffEncoder::new(&mut bytes)
            .unwrap()
            .write_image::<colortype::RGB8>(3, 2, &data)
            .unwrap();

        let image = crate::load(Cursor::new(bytes.into_inner())).unwrap();
        assert_eq!(image.dimensions, (3, 2));
        assert_eq!(image.pixel_count(), 6);
        assert_eq!(image.to_rgb8()[1], [3, 4, 5]);
    }

    #[test]
    fn gray_16_bit() {
        let mut bytes = Cursor::new(Vec::new());
        TiffEncoder::new(&mut bytes)
            .unwrap()
            .write_image::<colortype::Gray16>(2, 1, &[0x0102, 0xFF00])
            .unwrap();

        let image = load(Cursor::new(bytes.into_inner())).unwrap();
        assert_eq!(
            image.data,
            ImageData::Rgb16(vec![[0x0102; 3], [0xFF00; 3]])
        );
    }
}
