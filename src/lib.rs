use std::{
    fmt::Display,
    fs::{File, OpenOptions},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use clap::{builder::PossibleValue, ValueEnum};
use threadpool::ThreadPool;

pub use cli::CLIParser;
use decomposition::DecompositionMethod;
use engine::{CompressionEngine, CompressionOptions, DecompressionEngine};
pub use error::{Error, ErrorKind};
use frame::{decoder::FrameDecoder, encoder::FrameEncoder};

mod cli;
pub mod color;
pub mod decomposition;
pub mod engine;
mod error;
pub mod frame;
pub mod image;
mod logger;
pub mod rank;

pub type Result<T> = std::result::Result<T, error::Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
}

impl ValueEnum for Mode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Compress, Self::Decompress]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Compress => Some(PossibleValue::new("compress")),
            Self::Decompress => Some(PossibleValue::new("decompress")),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compress => write!(f, "Compression"),
            Self::Decompress => write!(f, "Decompression"),
        }
    }
}

pub struct Arguments {
    mode: Mode,
    input_file: PathBuf,
    output_file: PathBuf,
    method: Option<DecompositionMethod>,
    compression_factor: Option<f64>,
    /// Milliseconds.
    time_budget: Option<u64>,
    seed: Option<u64>,
    number_of_threads: usize,
}

impl Arguments {
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

fn open_input_file(file_path: &Path) -> Result<File> {
    File::open(file_path).map_err(|e| {
        Error::UnableToOpenInputFileForReading(file_path.display().to_string(), e)
    })
}

fn open_output_file(file_path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(|e| {
            Error::UnableToOpenOutputFileForWriting(file_path.display().to_string(), e)
        })
}

/// Reads an image, factorizes its channels and writes the compressed frame.
pub fn compress_image(arguments: &Arguments) -> Result<()> {
    let options = CompressionOptions::try_from(arguments)?;
    let image = image::load_image(&arguments.input_file)?;
    let threadpool = ThreadPool::new(arguments.number_of_threads.max(1));
    let frame = CompressionEngine::new(&options, &threadpool).compress(&image)?;
    let mut encoded: Vec<u8> = Vec::with_capacity(frame.encoded_len());
    FrameEncoder::new(&mut encoded, &frame).encode()?;
    let mut output_file = open_output_file(&arguments.output_file)?;
    output_file
        .write_all(&encoded)
        .map_err(Error::FailedToWriteFrame)?;
    log::info!(
        "Wrote {} bytes to '{}'",
        encoded.len(),
        arguments.output_file.display()
    );
    Ok(())
}

/// Reads a compressed frame and writes the reconstructed image. The output
/// file is left untouched if the frame is rejected.
pub fn decompress_image(arguments: &Arguments) -> Result<()> {
    let input_file = open_input_file(&arguments.input_file)?;
    let frame = FrameDecoder::new(BufReader::new(input_file)).decode()?;
    let image = DecompressionEngine::new().decompress(&frame)?;
    image::save_image(&image, &arguments.output_file)
}

pub fn run(arguments: &Arguments) -> Result<()> {
    match arguments.mode {
        Mode::Compress => compress_image(arguments),
        Mode::Decompress => decompress_image(arguments),
    }
}
