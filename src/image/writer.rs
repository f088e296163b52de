pub mod ppm;
pub mod raster;
