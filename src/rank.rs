use crate::error::Error;

/// Bytes used to store one factor element.
const BYTES_PER_FACTOR: f64 = 4.0;

/// Derives how many singular components to keep for one channel.
///
/// Storing `k` components costs `4 * k * (height + width + 1)` bytes per
/// channel, so the rank is chosen such that this cost does not exceed the
/// `height * width` bytes of the raw channel divided by `compression_factor`.
pub fn select_rank(height: usize, width: usize, compression_factor: f64) -> crate::Result<usize> {
    if !compression_factor.is_finite() || compression_factor <= 0.0 {
        return Err(Error::InvalidCompressionFactor(compression_factor));
    }
    let channel_bytes = (height * width) as f64;
    let component_bytes = BYTES_PER_FACTOR * (height + width + 1) as f64;
    let rank = (channel_bytes / (compression_factor * component_bytes)).floor();
    let max_rank = height.min(width);
    if rank < 1.0 || rank > max_rank as f64 {
        return Err(Error::InvalidRank {
            rank: rank as usize,
            height,
            width,
        });
    }
    Ok(rank as usize)
}

#[cfg(test)]
mod test {
    use super::select_rank;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn select_rank_for_square_image() {
        assert_eq!(select_rank(512, 512, 1.0).unwrap(), 63);
        assert_eq!(select_rank(512, 512, 2.0).unwrap(), 31);
        assert_eq!(select_rank(512, 512, 10.0).unwrap(), 6);
    }

    #[test]
    fn select_rank_for_wide_image() {
        // 480 * 640 / (4 * 1121) = 68.5
        assert_eq!(select_rank(480, 640, 1.0).unwrap(), 68);
    }

    #[test]
    fn fractional_compression_factor() {
        assert_eq!(select_rank(2, 2, 0.1).unwrap(), 2);
    }

    #[test]
    fn rank_does_not_increase_with_compression_factor() {
        let dimensions = [(16, 16), (100, 37), (240, 320), (1080, 1920)];
        for (height, width) in dimensions {
            let mut previous_rank = usize::MAX;
            for step in 1..200 {
                let factor = step as f64 * 0.25;
                let rank = select_rank(height, width, factor).unwrap_or(0);
                assert!(
                    rank <= previous_rank,
                    "Rank increased from {} to {} at factor {} for {}x{}",
                    previous_rank,
                    rank,
                    factor,
                    width,
                    height
                );
                previous_rank = rank;
            }
        }
    }

    #[test]
    fn reject_non_positive_compression_factor() {
        for factor in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let error = select_rank(64, 64, factor).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn reject_rank_zero() {
        match select_rank(100, 100, 1000.0) {
            Err(Error::InvalidRank { rank: 0, .. }) => {}
            result => panic!("Rank zero was not rejected: {:?}", result),
        }
    }

    #[test]
    fn reject_tiny_image() {
        let error = select_rank(1, 1, 1.0).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRank);
    }

    #[test]
    fn reject_rank_above_smallest_dimension() {
        let error = select_rank(4, 400, 0.01).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRank);
    }
}
