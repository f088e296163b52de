use std::time::{Duration, Instant};

use nalgebra::DMatrix;
use svd_image_codec::decomposition::{create_decomposer, DecomposerOptions, DecompositionMethod};
use svd_image_codec::rank::select_rank;

const IMAGE_WIDTH: usize = 640;
const IMAGE_HEIGHT: usize = 480;
const COMPRESSION_FACTOR: f64 = 2.0;

fn create_test_color_channel() -> DMatrix<f64> {
    DMatrix::from_fn(IMAGE_HEIGHT, IMAGE_WIDTH, |y, x| ((x + y * 8) % 256) as f64)
}

fn calculate_std_deviation_in_micros(mean: &Duration, measurements: &[Duration]) -> u64 {
    let mean_micros = mean.as_micros() as i128;
    let sum = measurements
        .iter()
        .map(|m| m.as_micros() as i128 - mean_micros)
        .map(|v| v.pow(2).unsigned_abs())
        .sum::<u128>();
    let variance = sum / measurements.len() as u128;
    (variance as f64).sqrt().round() as u64
}

const NUMBER_OF_ROUNDS: u32 = 5;

fn time_method(method: DecompositionMethod, channel: &DMatrix<f64>, rank: usize) {
    println!("Timing {} decomposition", method);
    let decomposer = create_decomposer(&DecomposerOptions {
        method,
        time_budget: None,
        seed: Some(1),
    });
    let mut durations: Vec<Duration> = Vec::new();

    for round in 1..=NUMBER_OF_ROUNDS {
        let start = Instant::now();
        let result = decomposer.decompose(channel, rank);
        let duration = start.elapsed();
        if let Err(e) = result {
            println!("Round {} failed because of: {}", round, e);
            return;
        }

        println!(
            "Finished round {} after {} microseconds",
            round,
            duration.as_micros(),
        );
        durations.push(duration);
    }

    let min_duration = durations.iter().min().copied().unwrap_or_default();
    let max_duration = durations.iter().max().copied().unwrap_or_default();
    let avg_duration = durations.iter().sum::<Duration>() / NUMBER_OF_ROUNDS;
    let std_deviation = calculate_std_deviation_in_micros(&avg_duration, &durations);

    println!(
        "Min: {}, Max: {}, Average: {}, Std Deviation: {}",
        min_duration.as_micros(),
        max_duration.as_micros(),
        avg_duration.as_micros(),
        std_deviation,
    );
}

fn main() {
    println!("Creating test channel");
    let channel = create_test_color_channel();
    let rank = match select_rank(IMAGE_HEIGHT, IMAGE_WIDTH, COMPRESSION_FACTOR) {
        Ok(rank) => rank,
        Err(e) => {
            eprintln!("Rank selection failed because of: {}", e);
            return;
        }
    };
    println!("Decomposing with rank {}", rank);

    for method in [
        DecompositionMethod::Direct,
        DecompositionMethod::BlockPowerIteration,
        DecompositionMethod::PowerIteration,
    ] {
        time_method(method, &channel, rank);
    }
}
