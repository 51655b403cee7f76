//! Min-max rescaling of attribution maps

use ndarray::{Array2, ArrayView2};
use num_traits::Float;

/// Smallest range, relative to the largest magnitude, treated as non-constant
pub fn flat_tolerance<A: Float>() -> A {
    A::epsilon() * A::from(16.0).unwrap_or_else(A::one)
}

/// Finite minimum and maximum of a grid, `None` if no finite value exists
pub fn finite_range<A: Float>(values: ArrayView2<'_, A>) -> Option<(A, A)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Rescale a grid so its minimum becomes 0 and its maximum 1
///
/// A constant grid (or one with no finite values) becomes all zeros, and
/// non-finite entries map to zero. Results are clamped to [0, 1] so rounding
/// can never escape the unit interval.
pub fn min_max_normalize<A: Float>(values: ArrayView2<'_, A>) -> Array2<A> {
    let Some((lo, hi)) = finite_range(values) else {
        return Array2::zeros(values.raw_dim());
    };

    // Flatness is judged relative to the largest magnitude
    let span = hi - lo;
    if span <= flat_tolerance::<A>() * hi.abs().max(lo.abs()) {
        return Array2::zeros(values.raw_dim());
    }

    values.mapv(|v| {
        if v.is_finite() {
            ((v - lo) / span).max(A::zero()).min(A::one())
        } else {
            A::zero()
        }
    })
}
