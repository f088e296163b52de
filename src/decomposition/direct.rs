use nalgebra::{DMatrix, DVector, SVD};

use super::{check_input, ChannelDecomposer, FactorTriple};
use crate::error::Error;

/// Exact decomposition. Computes the full SVD and keeps the `rank` largest
/// singular triples.
pub struct DirectDecomposer;

impl DirectDecomposer {
    fn descending_order(singular_values: &DVector<f64>) -> Vec<usize> {
        let mut order: Vec<usize> = (0..singular_values.len()).collect();
        order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]));
        order
    }
}

impl ChannelDecomposer for DirectDecomposer {
    fn decompose(&self, channel: &DMatrix<f64>, rank: usize) -> crate::Result<FactorTriple> {
        check_input(channel, rank)?;
        let (height, width) = channel.shape();
        let svd = SVD::try_new(channel.clone(), true, true, f64::EPSILON, 0).ok_or(
            Error::NumericalInstability("singular value decomposition did not converge"),
        )?;
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(Error::NumericalInstability(
                "singular vectors were not computed",
            ));
        };
        let order = Self::descending_order(&svd.singular_values);
        let kept = &order[..rank];
        let u = DMatrix::from_fn(height, rank, |row, column| u[(row, kept[column])]);
        let s = DVector::from_fn(rank, |index, _| svd.singular_values[kept[index]]);
        let vt = DMatrix::from_fn(rank, width, |row, column| v_t[(kept[row], column)]);
        FactorTriple::from_f64(&u, &s, &vt)
    }
}
