//! Closed-form rigid alignment of matched 2D point pairs (Kabsch).
//!
//! ```text
//! ā, b̄   = centroids of the source and target points
//! H      = Σ (aᵢ - ā)(bᵢ - b̄)ᵀ
//! H      = U·S·Vᵀ
//! R      = V·Uᵀ            (flip V's last column if det(R) < 0)
//! t      = b̄ - R·ā
//! ```
//!
//! Source points lying on one line leave the motion along that line
//! unobservable, so they are rejected rather than fitted.

use nalgebra::{Matrix2, Vector2};

use crate::core::types::{Point2D, Pose2D};
use crate::error::{Result, SlamError};

/// Point sets whose centered sum of squares falls below this are treated
/// as collapsed onto their centroid.
const MIN_SPREAD: f64 = 1e-12;

/// Smallest-to-largest eigenvalue ratio of the source scatter below which
/// the matched points count as collinear.
const MIN_SCATTER_RATIO: f64 = 1e-4;

/// Cross-covariance norm, relative to the point spreads, below which the
/// rotation is undefined.
const MIN_RELATIVE_COVARIANCE: f64 = 1e-9;

/// Best rigid transform mapping each `pair.0` onto its `pair.1`.
///
/// Fails with [`SlamError::DegenerateInput`] when fewer than two pairs are
/// given, when the source points are collinear, or when the geometry
/// leaves the rotation undefined.
pub(crate) fn align(pairs: &[(Point2D, Point2D)]) -> Result<Pose2D> {
    let n = pairs.len();
    if n < 2 {
        return Err(SlamError::DegenerateInput {
            correspondences: n,
            reason: "fewer than 2 correspondences",
        });
    }

    let inv_n = 1.0 / n as f64;
    let (sum_a, sum_b) = pairs.iter().fold(
        (Vector2::zeros(), Vector2::zeros()),
        |(sa, sb): (Vector2<f64>, Vector2<f64>), (a, b)| (sa + a.to_vector(), sb + b.to_vector()),
    );
    let centroid_a = sum_a * inv_n;
    let centroid_b = sum_b * inv_n;

    let mut h: Matrix2<f64> = Matrix2::zeros();
    let mut scatter_a: Matrix2<f64> = Matrix2::zeros();
    let mut spread_a = 0.0;
    let mut spread_b = 0.0;
    for (a, b) in pairs {
        let da = a.to_vector() - centroid_a;
        let db = b.to_vector() - centroid_b;
        h += da * db.transpose();
        scatter_a += da * da.transpose();
        spread_a += da.norm_squared();
        spread_b += db.norm_squared();
    }

    if spread_a < MIN_SPREAD || spread_b < MIN_SPREAD {
        return Err(SlamError::DegenerateInput {
            correspondences: n,
            reason: "matched points are coincident",
        });
    }

    let eigenvalues = scatter_a.symmetric_eigenvalues();
    let (lo, hi) = (eigenvalues.min(), eigenvalues.max());
    if lo < MIN_SCATTER_RATIO * hi {
        return Err(SlamError::DegenerateInput {
            correspondences: n,
            reason: "collinear correspondences",
        });
    }
    if h.norm() < MIN_RELATIVE_COVARIANCE * (spread_a * spread_b).sqrt() {
        return Err(SlamError::DegenerateInput {
            correspondences: n,
            reason: "cross-covariance vanishes",
        });
    }

    let svd = h.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(SlamError::DegenerateInput {
            correspondences: n,
            reason: "SVD did not produce singular vectors",
        });
    };

    let mut v = v_t.transpose();
    let mut rotation = v * u.transpose();

    // Reflection: flip the axis of the smallest singular value
    if rotation.determinant() < 0.0 {
        for i in 0..2 {
            v[(i, 1)] = -v[(i, 1)];
        }
        rotation = v * u.transpose();
    }

    let translation = centroid_b - rotation * centroid_a;
    Ok(Pose2D::from_rotation_translation(&rotation, &translation))
}
