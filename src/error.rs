use std::fmt::Display;

use crates_image::ImageError;

/// Coarse category of an [`Error`], used by callers that only care about
/// which part of the pipeline rejected the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    InvalidRank,
    Format,
    Io,
    NumericalInstability,
    Internal,
}

#[derive(Debug)]
pub enum Error {
    MissingRequiredParameter(&'static str),
    InvalidCompressionFactor(f64),
    InvalidRank {
        rank: usize,
        height: usize,
        width: usize,
    },
    InvalidMagic([u8; 4]),
    TruncatedFrame(&'static str),
    TrailingFrameBytes(u64),
    NonFiniteFactor(&'static str),
    FactorShapeMismatch(&'static str),
    DimensionsExceedFormat(usize, usize),
    PPMFileDoesNotContainRequiredToken(&'static str),
    ParsingOfTokenFailed(&'static str),
    IncompletePixelParsed(usize),
    MismatchOfSizeBetweenHeaderAndValues,
    ColorValueExceedsMaxValue(u16, u16),
    UnableToOpenInputFileForReading(String, std::io::Error),
    UnableToOpenOutputFileForWriting(String, std::io::Error),
    FailedToReadFrame(std::io::Error),
    FailedToWriteFrame(std::io::Error),
    FailedToReadImage(std::io::Error),
    FailedToWriteImage(std::io::Error),
    FailedToDecodeImage(String, ImageError),
    FailedToEncodeImage(String, ImageError),
    NumericalInstability(&'static str),
    DecompositionWorkerTerminated,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRequiredParameter(_) | Self::InvalidCompressionFactor(_) => {
                ErrorKind::Config
            }
            Self::InvalidRank { .. } => ErrorKind::InvalidRank,
            Self::InvalidMagic(_)
            | Self::TruncatedFrame(_)
            | Self::TrailingFrameBytes(_)
            | Self::NonFiniteFactor(_)
            | Self::FactorShapeMismatch(_)
            | Self::DimensionsExceedFormat(_, _)
            | Self::PPMFileDoesNotContainRequiredToken(_)
            | Self::ParsingOfTokenFailed(_)
            | Self::IncompletePixelParsed(_)
            | Self::MismatchOfSizeBetweenHeaderAndValues
            | Self::ColorValueExceedsMaxValue(_, _) => ErrorKind::Format,
            Self::UnableToOpenInputFileForReading(_, _)
            | Self::UnableToOpenOutputFileForWriting(_, _)
            | Self::FailedToReadFrame(_)
            | Self::FailedToWriteFrame(_)
            | Self::FailedToReadImage(_)
            | Self::FailedToWriteImage(_)
            | Self::FailedToDecodeImage(_, _)
            | Self::FailedToEncodeImage(_, _) => ErrorKind::Io,
            Self::NumericalInstability(_) => ErrorKind::NumericalInstability,
            Self::DecompositionWorkerTerminated => ErrorKind::Internal,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredParameter(name) => {
                write!(f, "Parameter '{}' is required for compression", name)
            }
            Self::InvalidCompressionFactor(factor) => {
                write!(
                    f,
                    "Compression factor must be a finite positive number, but was {}",
                    factor
                )
            }
            Self::InvalidRank {
                rank,
                height,
                width,
            } => {
                write!(
                    f,
                    "Rank {} is invalid for a {}x{} image. It must be between 1 and {}.",
                    rank,
                    width,
                    height,
                    height.min(width)
                )
            }
            Self::InvalidMagic(magic) => {
                write!(
                    f,
                    "Input is not a compressed frame. Expected magic 'SVDS', but got {:02X?}",
                    magic
                )
            }
            Self::TruncatedFrame(section) => {
                write!(f, "Compressed frame is truncated in section '{}'", section)
            }
            Self::TrailingFrameBytes(count) => {
                write!(
                    f,
                    "Compressed frame is followed by {} unexpected bytes",
                    count
                )
            }
            Self::NonFiniteFactor(channel) => {
                write!(f, "Factors of channel '{}' contain NaN or infinity", channel)
            }
            Self::FactorShapeMismatch(channel) => {
                write!(
                    f,
                    "Factors of channel '{}' do not match the frame dimensions",
                    channel
                )
            }
            Self::DimensionsExceedFormat(width, height) => {
                write!(
                    f,
                    "Image dimensions {}x{} exceed the supported range",
                    width, height
                )
            }
            Self::PPMFileDoesNotContainRequiredToken(token_name) => {
                write!(f, "Expected token '{}' not found in PPM file", token_name)
            }
            Self::ParsingOfTokenFailed(token_name) => {
                write!(f, "Parsing of token '{}' failed", token_name)
            }
            Self::IncompletePixelParsed(number_of_tokens_parsed) => {
                write!(
                    f,
                    "Incomplete pixel parsed. Expected 3 components, but got {}.",
                    number_of_tokens_parsed
                )
            }
            Self::MismatchOfSizeBetweenHeaderAndValues => {
                write!(
                    f,
                    "Number of pixels does not match the size provided in header"
                )
            }
            Self::ColorValueExceedsMaxValue(value, max) => {
                write!(
                    f,
                    "Color value {} is greater than the max value of {}",
                    value, max
                )
            }
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::FailedToReadFrame(error) => {
                write!(f, "Failed to read compressed frame: {}", error)
            }
            Self::FailedToWriteFrame(error) => {
                write!(f, "Failed to write compressed frame: {}", error)
            }
            Self::FailedToReadImage(error) => write!(f, "Failed to read image: {}", error),
            Self::FailedToWriteImage(error) => write!(f, "Failed to write image: {}", error),
            Self::FailedToDecodeImage(path, error) => {
                write!(f, "Failed to decode image '{}': {}", path, error)
            }
            Self::FailedToEncodeImage(path, error) => {
                write!(f, "Failed to encode image '{}': {}", path, error)
            }
            Self::NumericalInstability(reason) => {
                write!(f, "Numerical instability: {}", reason)
            }
            Self::DecompositionWorkerTerminated => {
                write!(f, "A channel decomposition worker terminated unexpectedly")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnableToOpenInputFileForReading(_, error)
            | Self::UnableToOpenOutputFileForWriting(_, error)
            | Self::FailedToReadFrame(error)
            | Self::FailedToWriteFrame(error)
            | Self::FailedToReadImage(error)
            | Self::FailedToWriteImage(error) => Some(error),
            Self::FailedToDecodeImage(_, error) | Self::FailedToEncodeImage(_, error) => {
                Some(error)
            }
            _ => None,
        }
    }
}
