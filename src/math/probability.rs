//! Logistic activation and probability ordering helpers

use std::cmp::Ordering;

/// Numerically stable logistic function
///
/// Avoids overflow of `exp` for large negative logits by evaluating the
/// mirrored form on that side of zero.
pub fn sigmoid(logit: f32) -> f32 {
    if logit >= 0.0 {
        1.0 / (1.0 + (-logit).exp())
    } else {
        let e = logit.exp();
        e / (1.0 + e)
    }
}

/// Indices of `probabilities` ordered by descending value
///
/// The sort is stable, so equal probabilities keep their declaration order.
/// NaN values sort last.
pub fn descending_order(probabilities: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| {
        let pa = probabilities.get(a).copied().unwrap_or(f32::NAN);
        let pb = probabilities.get(b).copied().unwrap_or(f32::NAN);
        match (pa.is_nan(), pb.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => pb.partial_cmp(&pa).unwrap_or(Ordering::Equal),
        }
    });
    order
}
