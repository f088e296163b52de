use std::{
    sync::mpsc,
    time::{Duration, Instant},
};

use nalgebra::DMatrix;
use threadpool::ThreadPool;

use crate::{
    color::ColorComponent,
    decomposition::{create_decomposer, DecomposerOptions, DecompositionMethod, FactorTriple},
    error::Error,
    frame::CompressedFrame,
    image::Image,
    rank::select_rank,
    Arguments, Result,
};

pub struct CompressionOptions {
    pub method: DecompositionMethod,
    pub compression_factor: f64,
    pub time_budget: Option<Duration>,
    pub seed: Option<u64>,
}

impl TryFrom<&Arguments> for CompressionOptions {
    type Error = Error;

    fn try_from(value: &Arguments) -> Result<Self> {
        Ok(Self {
            method: value
                .method
                .ok_or(Error::MissingRequiredParameter("method"))?,
            compression_factor: value
                .compression_factor
                .ok_or(Error::MissingRequiredParameter("compression"))?,
            time_budget: value.time_budget.map(Duration::from_millis),
            seed: value.seed,
        })
    }
}

impl From<&CompressionOptions> for DecomposerOptions {
    fn from(value: &CompressionOptions) -> Self {
        Self {
            method: value.method,
            time_budget: value.time_budget,
            seed: value.seed,
        }
    }
}

struct ChannelResult {
    index: usize,
    triple: Result<FactorTriple>,
    elapsed: Duration,
}

/// Turns an image into a [`CompressedFrame`] by decomposing every color
/// channel with the same rank.
pub struct CompressionEngine<'a> {
    options: &'a CompressionOptions,
    threadpool: &'a ThreadPool,
}

impl<'a> CompressionEngine<'a> {
    pub fn new(options: &'a CompressionOptions, threadpool: &'a ThreadPool) -> Self {
        Self {
            options,
            threadpool,
        }
    }

    pub fn compress(&self, image: &Image) -> Result<CompressedFrame> {
        let (height, width) = (image.height(), image.width());
        let rank = select_rank(height, width, self.options.compression_factor)?;
        log::info!(
            "Compressing {}x{} image with rank {} using {} decomposition",
            width,
            height,
            rank,
            self.options.method
        );
        let channels = self.decompose_all_channels(image, rank)?;
        CompressedFrame::new(height, width, rank, channels)
    }

    fn decompose_all_channels(&self, image: &Image, rank: usize) -> Result<[FactorTriple; 3]> {
        let decomposer = create_decomposer(&DecomposerOptions::from(self.options));
        let (sender, receiver) = mpsc::channel();
        for (index, component) in ColorComponent::ALL.into_iter().enumerate() {
            let channel = image.channel(component);
            let decomposer = decomposer.clone();
            let sender = sender.clone();
            self.threadpool.execute(move || {
                let start = Instant::now();
                let triple = decomposer.decompose(&channel, rank);
                let result = ChannelResult {
                    index,
                    triple,
                    elapsed: start.elapsed(),
                };
                // the receiver is gone if another channel already failed
                let _ = sender.send(result);
            });
        }
        drop(sender);

        let mut triples: [Option<FactorTriple>; 3] = [None, None, None];
        for _ in ColorComponent::ALL {
            let result = receiver
                .recv()
                .map_err(|_| Error::DecompositionWorkerTerminated)?;
            let component = ColorComponent::ALL[result.index];
            let triple = result.triple?;
            log::debug!(
                "Decomposed {} channel in {} ms",
                component,
                result.elapsed.as_millis()
            );
            triples[result.index] = Some(Self::complete_rank(triple, rank, component));
        }
        let [Some(red), Some(green), Some(blue)] = triples else {
            return Err(Error::DecompositionWorkerTerminated);
        };
        Ok([red, green, blue])
    }

    fn complete_rank(triple: FactorTriple, rank: usize, component: ColorComponent) -> FactorTriple {
        if triple.rank() < rank {
            log::warn!(
                "Only {} of {} components found for {} channel, padding with zeros",
                triple.rank(),
                rank,
                component
            );
        }
        triple.padded_to_rank(rank)
    }
}

/// Rebuilds an image from a [`CompressedFrame`].
#[derive(Default)]
pub struct DecompressionEngine;

impl DecompressionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn decompress(&self, frame: &CompressedFrame) -> Result<Image> {
        log::info!(
            "Reconstructing {}x{} image from rank {}",
            frame.width(),
            frame.height(),
            frame.rank()
        );
        let [red, green, blue]: [DMatrix<f64>; 3] =
            ColorComponent::ALL.map(|component| frame.channel(component).reconstruct());
        Image::from_channels(&red, &green, &blue)
    }
}

#[cfg(test)]
mod test {
    use std::{path::PathBuf, time::Duration};

    use nalgebra::{DMatrix, DVector};
    use threadpool::ThreadPool;

    use super::{CompressionEngine, CompressionOptions, DecompressionEngine};
    use crate::{
        color::{ColorComponent, RGBColorFormat},
        decomposition::{DecompositionMethod, FactorTriple},
        error::{Error, ErrorKind},
        frame::{encoder::FrameEncoder, CompressedFrame, HEADER_SIZE},
        image::Image,
        Arguments, Mode,
    };

    const WIDTH: usize = 32;
    const HEIGHT: usize = 24;

    fn create_test_image() -> Image {
        let dots = (0..WIDTH * HEIGHT)
            .map(|index| {
                let (row, column) = (index / WIDTH, index % WIDTH);
                let red = (1 + row % 5) * (8 + (column % 4) * 6);
                let green = 4 * row + 2 * column;
                let blue = 200 - (row * 7) % 3 * ((column * 3) % 5) * 10;
                RGBColorFormat::new(red as u8, green as u8, blue as u8)
            })
            .collect();
        Image::new(WIDTH, HEIGHT, dots).unwrap()
    }

    fn create_options(method: DecompositionMethod) -> CompressionOptions {
        CompressionOptions {
            method,
            compression_factor: 1.0,
            time_budget: Some(Duration::from_millis(500)),
            seed: Some(5),
        }
    }

    fn compress(method: DecompositionMethod, threads: usize) -> CompressedFrame {
        let options = create_options(method);
        let threadpool = ThreadPool::new(threads);
        CompressionEngine::new(&options, &threadpool)
            .compress(&create_test_image())
            .unwrap()
    }

    fn create_arguments() -> Arguments {
        Arguments {
            mode: Mode::Compress,
            input_file: PathBuf::from("input.ppm"),
            output_file: PathBuf::from("output.svds"),
            method: Some(DecompositionMethod::Direct),
            compression_factor: Some(2.0),
            time_budget: Some(250),
            seed: None,
            number_of_threads: 1,
        }
    }

    #[test]
    fn encoded_size_matches_rank_for_every_method() {
        let expected_rank = (HEIGHT * WIDTH) / (4 * (HEIGHT + WIDTH + 1));
        for method in [
            DecompositionMethod::Direct,
            DecompositionMethod::PowerIteration,
            DecompositionMethod::BlockPowerIteration,
        ] {
            let frame = compress(method, 3);
            assert_eq!(frame.rank(), expected_rank, "{}", method);
            let mut output: Vec<u8> = Vec::new();
            FrameEncoder::new(&mut output, &frame).encode().unwrap();
            assert_eq!(
                output.len(),
                HEADER_SIZE + 3 * 4 * expected_rank * (HEIGHT + WIDTH + 1),
                "{}",
                method
            );
        }
    }

    #[test]
    fn round_trip_keeps_dimensions_for_every_method() {
        for method in [
            DecompositionMethod::Direct,
            DecompositionMethod::PowerIteration,
            DecompositionMethod::BlockPowerIteration,
        ] {
            let frame = compress(method, 2);
            let image = DecompressionEngine::new().decompress(&frame).unwrap();
            assert_eq!(image.width(), WIDTH, "{}", method);
            assert_eq!(image.height(), HEIGHT, "{}", method);
        }
    }

    #[test]
    fn direct_reconstruction_is_close_for_low_rank_channel() {
        let original = create_test_image();
        let frame = compress(DecompositionMethod::Direct, 3);
        let image = DecompressionEngine::new().decompress(&frame).unwrap();
        // the red channel has rank one
        let error = original
            .dots()
            .iter()
            .zip(image.dots())
            .map(|(a, b)| (i16::from(a.red) - i16::from(b.red)).abs())
            .max()
            .unwrap();
        assert!(error <= 1, "Maximum error {} is too large", error);
    }

    #[test]
    fn thread_count_does_not_change_direct_result() {
        let sequential = compress(DecompositionMethod::Direct, 1);
        let parallel = compress(DecompositionMethod::Direct, 3);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn seeded_iterative_compression_is_reproducible() {
        let first = compress(DecompositionMethod::BlockPowerIteration, 1);
        let second = compress(DecompositionMethod::BlockPowerIteration, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn reject_factor_that_leaves_no_component() {
        let mut options = create_options(DecompositionMethod::Direct);
        options.compression_factor = 100.0;
        let threadpool = ThreadPool::new(1);
        let error = CompressionEngine::new(&options, &threadpool)
            .compress(&create_test_image())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRank);
    }

    #[test]
    fn clamp_oversized_reconstruction() {
        let bright = FactorTriple::new(
            DMatrix::from_element(2, 1, 1.0),
            DVector::from_element(1, 1000.0),
            DMatrix::from_element(1, 3, 1.0),
        );
        let dark = FactorTriple::new(
            DMatrix::from_element(2, 1, 1.0),
            DVector::from_element(1, 1000.0),
            DMatrix::from_element(1, 3, -1.0),
        );
        let frame = CompressedFrame::new(2, 3, 1, [bright.clone(), dark, bright]).unwrap();
        let image = DecompressionEngine::new().decompress(&frame).unwrap();
        assert!(image
            .dots()
            .iter()
            .all(|&dot| dot == RGBColorFormat::new(255, 0, 255)));
    }

    #[test]
    fn decompress_keeps_channel_order() {
        let triple = |value: f32| {
            FactorTriple::new(
                DMatrix::from_element(1, 1, 1.0),
                DVector::from_element(1, value),
                DMatrix::from_element(1, 1, 1.0),
            )
        };
        let frame = CompressedFrame::new(1, 1, 1, [triple(10.0), triple(20.0), triple(30.0)])
            .unwrap();
        let image = DecompressionEngine::new().decompress(&frame).unwrap();
        assert_eq!(image.dot(0, 0).component(ColorComponent::Red), 10);
        assert_eq!(image.dot(0, 0).component(ColorComponent::Green), 20);
        assert_eq!(image.dot(0, 0).component(ColorComponent::Blue), 30);
    }

    #[test]
    fn options_from_arguments() {
        let options = CompressionOptions::try_from(&create_arguments()).unwrap();
        assert_eq!(options.method, DecompositionMethod::Direct);
        assert_eq!(options.compression_factor, 2.0);
        assert_eq!(options.time_budget, Some(Duration::from_millis(250)));
        assert_eq!(options.seed, None);
    }

    #[test]
    fn options_require_method() {
        let mut arguments = create_arguments();
        arguments.method = None;
        match CompressionOptions::try_from(&arguments) {
            Err(Error::MissingRequiredParameter("method")) => {}
            Err(error) => panic!("Unexpected error: {}", error),
            Ok(_) => panic!("Missing method was not detected"),
        }
    }

    #[test]
    fn options_require_compression_factor() {
        let mut arguments = create_arguments();
        arguments.compression_factor = None;
        let error = CompressionOptions::try_from(&arguments)
            .err()
            .expect("Missing compression factor was not detected");
        assert_eq!(error.kind(), ErrorKind::Config);
    }
}
