use std::io::Write;

use super::super::{Image, ImageWriter};
use crate::error::Error;

const MAX_VALUE: u8 = u8::MAX;

/// Writes binary (P6) portable pixmaps with 8 bit samples.
pub struct PPMImageWriter<T: Write> {
    writer: T,
}

impl<T: Write> PPMImageWriter<T> {
    pub fn new(writer: T) -> Self {
        Self { writer }
    }

    fn write_header(&mut self, image: &Image) -> std::io::Result<()> {
        write!(
            self.writer,
            "P6\n{} {}\n{}\n",
            image.width(),
            image.height(),
            MAX_VALUE
        )
    }

    fn write_dots(&mut self, image: &Image) -> std::io::Result<()> {
        let raster: Vec<u8> = image
            .dots()
            .iter()
            .flat_map(|dot| [dot.red, dot.green, dot.blue])
            .collect();
        self.writer.write_all(&raster)
    }
}

impl<T: Write> ImageWriter for PPMImageWriter<T> {
    fn write_image(&mut self, image: &Image) -> crate::Result<()> {
        self.write_header(image)
            .map_err(Error::FailedToWriteImage)?;
        self.write_dots(image).map_err(Error::FailedToWriteImage)?;
        self.writer.flush().map_err(Error::FailedToWriteImage)
    }
}
