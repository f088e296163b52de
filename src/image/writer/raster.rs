use std::path::Path;

use crates_image::{ImageError, RgbImage};

use super::super::{Image, ImageWriter};
use crate::error::Error;

/// Writes an image in the format the `image` crate derives from the file
/// extension.
pub struct RasterImageWriter<'a> {
    path: &'a Path,
}

impl<'a> RasterImageWriter<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    fn map_error(&self, error: ImageError) -> Error {
        let path = self.path.display().to_string();
        match error {
            ImageError::IoError(error) => Error::UnableToOpenOutputFileForWriting(path, error),
            error => Error::FailedToEncodeImage(path, error),
        }
    }

    fn create_buffer(image: &Image) -> crate::Result<RgbImage> {
        let width = u32::try_from(image.width())
            .map_err(|_| Error::DimensionsExceedFormat(image.width(), image.height()))?;
        let height = u32::try_from(image.height())
            .map_err(|_| Error::DimensionsExceedFormat(image.width(), image.height()))?;
        let raster: Vec<u8> = image
            .dots()
            .iter()
            .flat_map(|dot| [dot.red, dot.green, dot.blue])
            .collect();
        RgbImage::from_raw(width, height, raster).ok_or(Error::MismatchOfSizeBetweenHeaderAndValues)
    }
}

impl ImageWriter for RasterImageWriter<'_> {
    fn write_image(&mut self, image: &Image) -> crate::Result<()> {
        let buffer = Self::create_buffer(image)?;
        buffer.save(self.path).map_err(|e| self.map_error(e))
    }
}
