use std::{fmt::Display, sync::Arc, time::Duration};

use clap::{builder::PossibleValue, ValueEnum};
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::Error;

pub mod block_power_iteration;
pub mod deadline;
pub mod direct;
pub mod power_iteration;

use block_power_iteration::BlockPowerIterationDecomposer;
use direct::DirectDecomposer;
use power_iteration::PowerIterationDecomposer;

/// Absolute and relative tolerance of the iterative convergence checks.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-8;
/// Iterations between two convergence and deadline checks.
pub const CHECK_INTERVAL: usize = 10;

/// Computes a rank limited approximation `U * diag(s) * Vt` of one channel.
///
/// Implementations return at most `rank` components. Time bounded strategies
/// may return fewer when their budget runs out.
pub trait ChannelDecomposer {
    fn decompose(&self, channel: &DMatrix<f64>, rank: usize) -> crate::Result<FactorTriple>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct FactorTriple {
    u: DMatrix<f32>,
    s: DVector<f32>,
    vt: DMatrix<f32>,
}

impl FactorTriple {
    pub fn new(u: DMatrix<f32>, s: DVector<f32>, vt: DMatrix<f32>) -> Self {
        debug_assert_eq!(u.ncols(), s.len());
        debug_assert_eq!(vt.nrows(), s.len());
        Self { u, s, vt }
    }

    pub fn zeros(height: usize, width: usize, rank: usize) -> Self {
        Self {
            u: DMatrix::zeros(height, rank),
            s: DVector::zeros(rank),
            vt: DMatrix::zeros(rank, width),
        }
    }

    /// Narrows double precision factors to the stored single precision.
    pub fn from_f64(
        u: &DMatrix<f64>,
        s: &DVector<f64>,
        vt: &DMatrix<f64>,
    ) -> crate::Result<Self> {
        let triple = Self::new(u.map(|v| v as f32), s.map(|v| v as f32), vt.map(|v| v as f32));
        if !triple.is_finite() {
            return Err(Error::NumericalInstability(
                "factor matrices contain NaN or infinity",
            ));
        }
        Ok(triple)
    }

    pub fn rank(&self) -> usize {
        self.s.len()
    }

    pub fn height(&self) -> usize {
        self.u.nrows()
    }

    pub fn width(&self) -> usize {
        self.vt.ncols()
    }

    pub fn u(&self) -> &DMatrix<f32> {
        &self.u
    }

    pub fn singular_values(&self) -> &DVector<f32> {
        &self.s
    }

    pub fn vt(&self) -> &DMatrix<f32> {
        &self.vt
    }

    pub fn is_finite(&self) -> bool {
        self.u
            .iter()
            .chain(self.s.iter())
            .chain(self.vt.iter())
            .all(|value| value.is_finite())
    }

    /// Appends zero components until the triple has `rank` components.
    pub fn padded_to_rank(self, rank: usize) -> Self {
        if self.rank() >= rank {
            return self;
        }
        Self {
            u: self.u.resize_horizontally(rank, 0.0),
            s: self.s.resize_vertically(rank, 0.0),
            vt: self.vt.resize_vertically(rank, 0.0),
        }
    }

    /// Computes `U * diag(s) * Vt`.
    pub fn reconstruct(&self) -> DMatrix<f64> {
        let mut scaled = self.u.map(f64::from);
        for (mut column, &value) in scaled.column_iter_mut().zip(self.s.iter()) {
            column.scale_mut(f64::from(value));
        }
        scaled * self.vt.map(f64::from)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompositionMethod {
    Direct,
    PowerIteration,
    BlockPowerIteration,
}

impl ValueEnum for DecompositionMethod {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Direct, Self::PowerIteration, Self::BlockPowerIteration]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Direct => Some(PossibleValue::new("direct").alias("numpy")),
            Self::PowerIteration => Some(PossibleValue::new("power-iteration").alias("simple")),
            Self::BlockPowerIteration => {
                Some(PossibleValue::new("block-power-iteration").alias("advanced"))
            }
        }
    }
}

impl Display for DecompositionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::PowerIteration => write!(f, "power iteration"),
            Self::BlockPowerIteration => write!(f, "block power iteration"),
        }
    }
}

pub struct DecomposerOptions {
    pub method: DecompositionMethod,
    /// Overrides the default time budget of the iterative strategies.
    pub time_budget: Option<Duration>,
    pub seed: Option<u64>,
}

pub fn create_decomposer(options: &DecomposerOptions) -> Arc<dyn ChannelDecomposer + Send + Sync> {
    match options.method {
        DecompositionMethod::Direct => Arc::new(DirectDecomposer),
        DecompositionMethod::PowerIteration => Arc::new(PowerIterationDecomposer::new(
            options
                .time_budget
                .unwrap_or(power_iteration::DEFAULT_TIME_BUDGET),
            options.seed,
        )),
        DecompositionMethod::BlockPowerIteration => {
            Arc::new(BlockPowerIterationDecomposer::new(
                options
                    .time_budget
                    .unwrap_or(block_power_iteration::DEFAULT_TIME_BUDGET),
                options.seed,
            ))
        }
    }
}

fn check_input(channel: &DMatrix<f64>, rank: usize) -> crate::Result<()> {
    let (height, width) = channel.shape();
    if rank == 0 || rank > height.min(width) {
        return Err(Error::InvalidRank {
            rank,
            height,
            width,
        });
    }
    if channel.iter().any(|value| !value.is_finite()) {
        return Err(Error::NumericalInstability(
            "channel contains NaN or infinity",
        ));
    }
    Ok(())
}

fn is_zero_channel(channel: &DMatrix<f64>) -> bool {
    channel.iter().all(|&value| value == 0.0)
}

fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn random_matrix(rng: &mut StdRng, rows: usize, columns: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, columns, |_, _| rng.gen_range(-1.0..1.0))
}

/// Element wise `|a - b| <= tolerance + tolerance * |b|`.
fn all_close<'a>(
    a: impl IntoIterator<Item = &'a f64>,
    b: impl IntoIterator<Item = &'a f64>,
    tolerance: f64,
) -> bool {
    a.into_iter()
        .zip(b)
        .all(|(a, b)| (a - b).abs() <= tolerance + tolerance * b.abs())
}
