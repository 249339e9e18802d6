#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReadError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("UnknownFormat: could not determine the image file format.")]
    UnknownFormat,

    #[error("UnsupportedFeature: the image file uses a feature that is currently unsupported ({0}).")]
    UnsupportedFeature(String),

    #[error("Decode: the image file is malformed ({0}).")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WriteError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("InvalidInput: {0}")]
    InvalidInput(String),

    #[error("Encode: {0}")]
    Encode(String),
}

//-------------------------------------------------------------
// From impls.

impl From<png::DecodingError> for ReadError {
    fn from(other: png::DecodingError) -> Self {
        match other {
            png::DecodingError::IoError(e) => Self::IO(e),
            e => Self::Decode(e.to_string()),
        }
    }
}

impl From<jpeg_decoder::Error> for ReadError {
    fn from(other: jpeg_decoder::Error) -> Self {
        match other {
            jpeg_decoder::Error::Io(e) => Self::IO(e),
            jpeg_decoder::Error::Unsupported(f) => Self::UnsupportedFeature(format!("{:?}", f)),
            e => Self::Decode(e.to_string()),
        }
    }
}

impl From<tiff::TiffError> for ReadError {
    fn from(other: tiff::TiffError) -> Self {
        use tiff::TiffError::*;
        match other {
            IoError(e) => Self::IO(e),
            UnsupportedError(e) => Self::UnsupportedFeature(e.to_string()),
            e => Self::Decode(e.to_string()),
        }
    }
}

impl From<png::EncodingError> for WriteError {
    fn from(other: png::EncodingError) -> Self {
        match other {
            png::EncodingError::IoError(e) => Self::IO(e),
            e => Self::Encode(e.to_string()),
        }
    }
}
