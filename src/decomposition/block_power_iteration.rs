use std::time::Duration;

use nalgebra::{DMatrix, DVector};

use super::{
    all_close, check_input, create_rng, deadline::Deadline, is_zero_channel, random_matrix,
    ChannelDecomposer, FactorTriple, CHECK_INTERVAL, CONVERGENCE_TOLERANCE,
};

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(1_000);

/// Simultaneous iteration on a `rank` dimensional subspace, re-orthonormalized
/// by QR in every step.
///
/// The right subspace starts from a random orthonormal basis. At least one
/// full iteration is always performed, afterwards the deadline and the
/// convergence criterion `A * V = U * R'` are checked every
/// [`CHECK_INTERVAL`] iterations.
pub struct BlockPowerIterationDecomposer {
    time_budget: Duration,
    seed: Option<u64>,
}

struct Subspaces {
    left: DMatrix<f64>,
    right: DMatrix<f64>,
    triangular: DMatrix<f64>,
}

impl BlockPowerIterationDecomposer {
    pub fn new(time_budget: Duration, seed: Option<u64>) -> Self {
        Self { time_budget, seed }
    }

    fn iterate(channel: &DMatrix<f64>, right: &DMatrix<f64>) -> Subspaces {
        let left = (channel * right).qr().q();
        let (right, triangular) = channel.tr_mul(&left).qr().unpack();
        Subspaces {
            left,
            right,
            triangular,
        }
    }

    fn has_converged(channel: &DMatrix<f64>, subspaces: &Subspaces) -> bool {
        let projected = channel * &subspaces.right;
        let expected = &subspaces.left * subspaces.triangular.transpose();
        all_close(projected.iter(), expected.iter(), CONVERGENCE_TOLERANCE)
    }

    /// Takes the diagonal of `R` as singular values and moves negative signs
    /// into the right singular vectors.
    fn into_factors(subspaces: Subspaces) -> crate::Result<FactorTriple> {
        let Subspaces {
            left,
            mut right,
            triangular,
        } = subspaces;
        let rank = triangular.nrows().min(triangular.ncols());
        let mut singular_values = DVector::zeros(rank);
        for index in 0..rank {
            let value = triangular[(index, index)];
            if value < 0.0 {
                right.column_mut(index).neg_mut();
            }
            singular_values[index] = value.abs();
        }
        FactorTriple::from_f64(&left, &singular_values, &right.transpose())
    }
}

impl ChannelDecomposer for BlockPowerIterationDecomposer {
    fn decompose(&self, channel: &DMatrix<f64>, rank: usize) -> crate::Result<FactorTriple> {
        check_input(channel, rank)?;
        let (height, width) = channel.shape();
        if is_zero_channel(channel) {
            return Ok(FactorTriple::zeros(height, width, rank));
        }
        let mut rng = create_rng(self.seed);
        let seed_basis = random_matrix(&mut rng, width, rank).qr().q();
        let deadline = Deadline::after(self.time_budget);
        let mut subspaces = Self::iterate(channel, &seed_basis);
        let mut iterations = 1;
        loop {
            if iterations % CHECK_INTERVAL == 0 {
                if Self::has_converged(channel, &subspaces) {
                    break;
                }
                if deadline.has_expired() {
                    log::warn!(
                        "Time budget exhausted after {} iterations without convergence",
                        iterations
                    );
                    break;
                }
            }
            subspaces = Self::iterate(channel, &subspaces.right);
            iterations += 1;
        }
        log::trace!("Block power iteration stopped after {} iterations", iterations);
        Self::into_factors(subspaces)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use nalgebra::DMatrix;

    use super::BlockPowerIterationDecomposer;
    use crate::decomposition::{
        direct::DirectDecomposer,
        test_matrices::{max_absolute_error, rank_two},
        ChannelDecomposer,
    };

    fn create_decomposer() -> BlockPowerIterationDecomposer {
        BlockPowerIterationDecomposer::new(Duration::from_millis(1_000), Some(11))
    }

    #[test]
    fn reconstruct_rank_two_channel() {
        let channel = rank_two(20, 26);
        let triple = create_decomposer().decompose(&channel, 2).unwrap();
        assert_eq!(triple.u().shape(), (20, 2));
        assert_eq!(triple.singular_values().len(), 2);
        assert_eq!(triple.vt().shape(), (2, 26));
        let error = max_absolute_error(&triple.reconstruct(), &channel);
        assert!(error < 1.0, "Maximum error {} is too large", error);
    }

    #[test]
    fn singular_values_are_non_negative_and_match_direct() {
        let channel = rank_two(14, 11);
        let expected = DirectDecomposer.decompose(&channel, 2).unwrap();
        let actual = create_decomposer().decompose(&channel, 2).unwrap();
        for index in 0..2 {
            let expected = expected.singular_values()[index];
            let actual = actual.singular_values()[index];
            assert!(actual >= 0.0);
            assert!(
                (expected - actual).abs() <= expected * 1e-4,
                "Singular value {} differs: {} vs {}",
                index,
                expected,
                actual
            );
        }
    }

    #[test]
    fn rank_above_matrix_rank() {
        let channel = rank_two(9, 13);
        let triple = create_decomposer().decompose(&channel, 4).unwrap();
        assert_eq!(triple.rank(), 4);
        assert!(triple.is_finite());
        let error = max_absolute_error(&triple.reconstruct(), &channel);
        assert!(error < 1.0, "Maximum error {} is too large", error);
    }

    #[test]
    fn expired_budget_still_iterates_once() {
        let channel = rank_two(8, 8);
        let decomposer = BlockPowerIterationDecomposer::new(Duration::ZERO, Some(3));
        let triple = decomposer.decompose(&channel, 2).unwrap();
        assert_eq!(triple.rank(), 2);
        assert!(triple.is_finite());
        assert!(triple.singular_values()[0] > 0.0);
    }

    #[test]
    fn zero_channel_gives_zero_factors() {
        let channel = DMatrix::zeros(6, 4);
        let triple = create_decomposer().decompose(&channel, 4).unwrap();
        assert!(triple.reconstruct().iter().all(|&value| value == 0.0));
    }
}
