use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use nalgebra::DMatrix;

use crate::{
    color::{quantize_component, ColorComponent, RGBColorFormat},
    error::Error,
    open_input_file, open_output_file, Result,
};

pub mod reader;
pub mod writer;

use reader::{ppm::PPMImageReader, raster::RasterImageReader};
use writer::{ppm::PPMImageWriter, raster::RasterImageWriter};

pub trait ImageReader {
    fn read_image(&mut self) -> Result<Image>;
}

pub trait ImageWriter {
    fn write_image(&mut self, image: &Image) -> Result<()>;
}

/// An 8 bit RGB raster in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    dots: Vec<RGBColorFormat<u8>>,
}

impl Image {
    pub fn new(width: usize, height: usize, dots: Vec<RGBColorFormat<u8>>) -> Result<Self> {
        if width.checked_mul(height) != Some(dots.len()) {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        Ok(Self {
            width,
            height,
            dots,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dots(&self) -> &[RGBColorFormat<u8>] {
        &self.dots
    }

    pub fn dot(&self, column_index: usize, row_index: usize) -> RGBColorFormat<u8> {
        self.dots[column_index + row_index * self.width]
    }

    /// Extracts one color component as a height x width matrix.
    pub fn channel(&self, component: ColorComponent) -> DMatrix<f64> {
        DMatrix::from_fn(self.height, self.width, |row_index, column_index| {
            f64::from(self.dot(column_index, row_index).component(component))
        })
    }

    /// Assembles an image from three reconstructed channels. Every sample is
    /// rounded and clamped to [0, 255].
    pub fn from_channels(
        red: &DMatrix<f64>,
        green: &DMatrix<f64>,
        blue: &DMatrix<f64>,
    ) -> Result<Self> {
        let shape = red.shape();
        if green.shape() != shape || blue.shape() != shape {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        let (height, width) = shape;
        let dots = (0..height)
            .flat_map(|row_index| (0..width).map(move |column_index| (row_index, column_index)))
            .map(|index| {
                RGBColorFormat::new(
                    quantize_component(red[index]),
                    quantize_component(green[index]),
                    quantize_component(blue[index]),
                )
            })
            .collect();
        Self::new(width, height, dots)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFileFormat {
    PortablePixmap,
    Raster,
}

impl ImageFileFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("ppm") | Some("pnm") => Self::PortablePixmap,
            _ => Self::Raster,
        }
    }
}

pub fn load_image(path: &Path) -> Result<Image> {
    let image = match ImageFileFormat::from_path(path) {
        ImageFileFormat::PortablePixmap => {
            let input_file = open_input_file(path)?;
            PPMImageReader::new(BufReader::new(input_file)).read_image()?
        }
        ImageFileFormat::Raster => RasterImageReader::new(path).read_image()?,
    };
    log::info!(
        "Loaded {}x{} image from '{}'",
        image.width,
        image.height,
        path.display()
    );
    Ok(image)
}

pub fn save_image(image: &Image, path: &Path) -> Result<()> {
    match ImageFileFormat::from_path(path) {
        ImageFileFormat::PortablePixmap => {
            let output_file: File = open_output_file(path)?;
            PPMImageWriter::new(BufWriter::new(output_file)).write_image(image)?
        }
        ImageFileFormat::Raster => RasterImageWriter::new(path).write_image(image)?,
    }
    log::info!(
        "Saved {}x{} image to '{}'",
        image.width,
        image.height,
        path.display()
    );
    Ok(())
}
