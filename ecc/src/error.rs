use thiserror::Error;

use crate::Curve;

/// Errors returned by elliptic curve operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The two keys or points in an operation belong to different curves.
    #[error("curve mismatch: expected {expected}, found {found}")]
    CurveMismatch {
        /// The curve the operation was bound to.
        expected: Curve,
        /// The curve actually presented.
        found: Curve,
    },

    /// The coordinates do not satisfy the curve equation.
    #[error("point is not on curve {0}")]
    NotOnCurve(Curve),

    /// A coordinate or scalar is longer than the curve's field width.
    #[error("value exceeds {width} bytes")]
    InvalidLength {
        /// The fixed field width for the curve, in bytes.
        width: usize,
    },

    /// The scalar is zero or not less than the curve order.
    #[error("invalid secret key for curve {0}")]
    InvalidSecretKey(Curve),

    /// The operation produced the point at infinity.
    #[error("point at infinity")]
    PointAtInfinity,
}
