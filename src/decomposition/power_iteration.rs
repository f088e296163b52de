use std::time::Duration;

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;

use super::{
    all_close, check_input, create_rng, deadline::Deadline, is_zero_channel, random_matrix,
    ChannelDecomposer, FactorTriple, CHECK_INTERVAL, CONVERGENCE_TOLERANCE,
};

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(50_000);

/// Residual energy, relative to the channel, below which no further
/// components are extracted.
const NEGLIGIBLE_RESIDUAL: f64 = 1e-9;

/// Extracts one singular triple at a time from the Gram matrix of a deflated
/// residual.
///
/// Every component gets its own deadline of `time_budget`. If a deadline has
/// already passed before the first iteration of a component, the components
/// found so far are returned and the result has a lower rank than requested.
pub struct PowerIterationDecomposer {
    time_budget: Duration,
    seed: Option<u64>,
}

impl PowerIterationDecomposer {
    pub fn new(time_budget: Duration, seed: Option<u64>) -> Self {
        Self { time_budget, seed }
    }

    fn random_unit_vector(rng: &mut StdRng, length: usize) -> DVector<f64> {
        let vector = DVector::from_column_slice(random_matrix(rng, length, 1).as_slice());
        let norm = vector.norm();
        if norm == 0.0 {
            let mut fallback = DVector::zeros(length);
            fallback[0] = 1.0;
            return fallback;
        }
        vector / norm
    }

    /// Returns `None` if the deadline expired before a single iteration.
    fn dominant_eigenvector(
        gram: &DMatrix<f64>,
        start: DVector<f64>,
        deadline: &Deadline,
    ) -> Option<DVector<f64>> {
        let mut vector = start;
        let mut iterations = 0;
        loop {
            if iterations % CHECK_INTERVAL == 0 && deadline.has_expired() {
                break;
            }
            let product = gram * &vector;
            let norm = product.norm();
            iterations += 1;
            if norm == 0.0 {
                // vector lies in the null space of the residual
                break;
            }
            let next = product / norm;
            let converged = iterations % CHECK_INTERVAL == 0
                && all_close(next.iter(), vector.iter(), CONVERGENCE_TOLERANCE);
            vector = next;
            if converged {
                break;
            }
        }
        log::trace!("Power iteration stopped after {} iterations", iterations);
        (iterations > 0).then_some(vector)
    }

    fn assemble(
        height: usize,
        width: usize,
        left: &[DVector<f64>],
        singular_values: &[f64],
        right: &[DVector<f64>],
    ) -> crate::Result<FactorTriple> {
        let rank = singular_values.len();
        let u = DMatrix::from_fn(height, rank, |row, column| left[column][row]);
        let s = DVector::from_column_slice(singular_values);
        let vt = DMatrix::from_fn(rank, width, |row, column| right[row][column]);
        FactorTriple::from_f64(&u, &s, &vt)
    }
}

impl ChannelDecomposer for PowerIterationDecomposer {
    fn decompose(&self, channel: &DMatrix<f64>, rank: usize) -> crate::Result<FactorTriple> {
        check_input(channel, rank)?;
        let (height, width) = channel.shape();
        if is_zero_channel(channel) {
            return Ok(FactorTriple::zeros(height, width, rank));
        }
        let mut rng = create_rng(self.seed);
        let negligible = NEGLIGIBLE_RESIDUAL * channel.norm();
        let mut residual = channel.clone();
        let mut left = Vec::with_capacity(rank);
        let mut singular_values = Vec::with_capacity(rank);
        let mut right = Vec::with_capacity(rank);

        for component in 0..rank {
            if residual.norm() <= negligible {
                log::debug!(
                    "Residual exhausted after {} of {} components",
                    component,
                    rank
                );
                break;
            }
            let gram = residual.tr_mul(&residual);
            let deadline = Deadline::after(self.time_budget);
            let start = Self::random_unit_vector(&mut rng, width);
            let Some(v) = Self::dominant_eigenvector(&gram, start, &deadline) else {
                log::warn!(
                    "Time budget exhausted, returning {} of {} components",
                    component,
                    rank
                );
                break;
            };
            // sigma = sqrt(v' * A'A * v)
            let projection = &residual * &v;
            let sigma = projection.norm();
            if sigma <= negligible {
                break;
            }
            let u = projection / sigma;
            residual.ger(-sigma, &u, &v, 1.0);
            left.push(u);
            singular_values.push(sigma);
            right.push(v);
        }

        Self::assemble(height, width, &left, &singular_values, &right)
    }
}
