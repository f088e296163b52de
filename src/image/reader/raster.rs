use std::path::Path;

use crates_image::ImageError;

use super::super::{Image, ImageReader};
use crate::color::RGBColorFormat;
use crate::error::Error;

/// Reads every format the `image` crate can decode, converted to 8 bit RGB.
pub struct RasterImageReader<'a> {
    path: &'a Path,
}

impl<'a> RasterImageReader<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    fn map_error(&self, error: ImageError) -> Error {
        let path = self.path.display().to_string();
        match error {
            ImageError::IoError(error) => Error::UnableToOpenInputFileForReading(path, error),
            error => Error::FailedToDecodeImage(path, error),
        }
    }
}

impl ImageReader for RasterImageReader<'_> {
    fn read_image(&mut self) -> crate::Result<Image> {
        let decoded = crates_image::open(self.path).map_err(|e| self.map_error(e))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        let dots = rgb
            .pixels()
            .map(|pixel| {
                let [red, green, blue] = pixel.0;
                RGBColorFormat::new(red, green, blue)
            })
            .collect();
        Image::new(width as usize, height as usize, dots)
    }
}
