//! Report emitter: residual ranking and formatted terminal/JSON output.
//!
//! The pipeline only produces structured records; everything that turns them
//! into text lives here.

use crate::domain::PointResidual;

pub mod format;

pub use format::*;

/// The `top_n` residuals with the largest `|pull|`, largest first.
///
/// Ties keep dataset order.
pub fn rank_by_pull(residuals: &[PointResidual], top_n: usize) -> Vec<PointResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.pull
            .abs()
            .partial_cmp(&a.pull.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observable;

    fn residual(z: f64, pull: f64) -> PointResidual {
        PointResidual {
            z,
            observable: Observable::HubbleRate,
            observed: 70.0 + pull,
            predicted: 70.0,
            sigma: 1.0,
            pull,
        }
    }

    #[test]
    fn ranks_by_absolute_pull() {
        let rs = vec![
            residual(0.1, 0.5),
            residual(0.2, -3.0),
            residual(0.3, 2.0),
            residual(0.4, -0.1),
        ];
        let top = rank_by_pull(&rs, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].z, 0.2);
        assert_eq!(top[1].z, 0.3);
    }

    #[test]
    fn top_n_larger_than_input_returns_everything() {
        let rs = vec![residual(0.1, 1.0), residual(0.2, 1.0)];
        let top = rank_by_pull(&rs, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].z, 0.1);
        assert!(rank_by_pull(&rs, 0).is_empty());
    }
}
