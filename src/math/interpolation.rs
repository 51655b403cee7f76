//! Bilinear resampling of 2D grids
//!
//! Sample positions are pixel-center aligned: output pixel `i` of an axis
//! resized from `n` to `m` samples the source at `(i + 0.5) * n / m - 0.5`,
//! so neither axis is cropped or shifted. Axes that shrink are smoothed
//! with a Gaussian first so detail finer than the output grid averages out
//! instead of aliasing.

use ndarray::{Array2, ArrayView2, Axis, Slice};
use std::error::Error;
use std::fmt;

/// Error type for interpolation operations
#[derive(Debug, Clone)]
pub struct InterpolationError {
    message: String,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interpolation error: {}", self.message)
    }
}

impl Error for InterpolationError {}

impl InterpolationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// How samples falling outside the source grid are resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// Out-of-range neighbors read a fixed value
    Constant(f32),
    /// Sample positions clamp to the nearest edge pixel
    Edge,
}

/// Gaussian standard deviation, in source pixels, used before shrinking an
/// axis from `source_len` to `target_len` samples
///
/// Zero when the axis keeps its length or grows.
pub fn anti_alias_sigma(source_len: usize, target_len: usize) -> f32 {
    if target_len == 0 {
        return 0.0;
    }
    ((source_len as f32 / target_len as f32 - 1.0) / 2.0).max(0.0)
}

/// Normalized Gaussian taps truncated at four standard deviations
fn gaussian_taps(sigma: f32) -> Vec<f32> {
    let radius = 4.0f32.mul_add(sigma, 0.5).floor() as usize;
    let taps: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let offset = (i as f32 - radius as f32) / sigma;
            (-0.5 * offset * offset).exp()
        })
        .collect();
    let total: f32 = taps.iter().sum();
    taps.into_iter().map(|tap| tap / total).collect()
}

/// Convolve one axis with a Gaussian, padding per the boundary mode
fn smooth_axis(
    source: ArrayView2<'_, f32>,
    axis: Axis,
    sigma: f32,
    boundary: Boundary,
) -> Array2<f32> {
    let taps = gaussian_taps(sigma);
    let radius = taps.len() / 2;
    let len = source.len_of(axis);
    if radius == 0 || len == 0 {
        return source.to_owned();
    }

    let (rows, cols) = source.dim();
    let padded_shape = if axis == Axis(0) {
        (rows + 2 * radius, cols)
    } else {
        (rows, cols + 2 * radius)
    };
    let fill = match boundary {
        Boundary::Constant(value) => value,
        Boundary::Edge => 0.0,
    };

    let mut padded = Array2::from_elem(padded_shape, fill);
    padded
        .slice_axis_mut(axis, Slice::from(radius..radius + len))
        .assign(&source);
    if matches!(boundary, Boundary::Edge) {
        let first = source.index_axis(axis, 0);
        let last = source.index_axis(axis, len - 1);
        for i in 0..radius {
            padded.index_axis_mut(axis, i).assign(&first);
            padded.index_axis_mut(axis, radius + len + i).assign(&last);
        }
    }

    let mut smoothed = Array2::zeros((rows, cols));
    for (offset, &weight) in taps.iter().enumerate() {
        smoothed.scaled_add(
            weight,
            &padded.slice_axis(axis, Slice::from(offset..offset + len)),
        );
    }
    smoothed
}

/// Pre-filter every axis that shrinks on the way to `shape`
fn anti_alias(
    source: ArrayView2<'_, f32>,
    shape: (usize, usize),
    boundary: Boundary,
) -> Array2<f32> {
    let (source_rows, source_cols) = source.dim();
    let mut filtered = source.to_owned();
    for (axis, from, to) in [
        (Axis(0), source_rows, shape.0),
        (Axis(1), source_cols, shape.1),
    ] {
        let sigma = anti_alias_sigma(from, to);
        if sigma > 0.0 {
            filtered = smooth_axis(filtered.view(), axis, sigma, boundary);
        }
    }
    filtered
}

/// Neighbor pair and blend factor for one output coordinate
#[derive(Debug, Clone, Copy, Default)]
struct AxisSample {
    lo: Option<usize>,
    hi: Option<usize>,
    t: f32,
}

fn axis_samples(source_len: usize, target_len: usize, boundary: Boundary) -> Vec<AxisSample> {
    let scale = source_len as f32 / target_len as f32;
    let last = source_len.saturating_sub(1) as f32;

    (0..target_len)
        .map(|i| {
            let position = (i as f32 + 0.5).mul_add(scale, -0.5);
            match boundary {
                Boundary::Edge => {
                    let clamped = position.clamp(0.0, last);
                    let lo = clamped.floor();
                    let lo_index = lo as usize;
                    AxisSample {
                        lo: Some(lo_index),
                        hi: Some((lo_index + 1).min(source_len - 1)),
                        t: clamped - lo,
                    }
                }
                Boundary::Constant(_) => {
                    let lo = position.floor();
                    let within = |index: f32| {
                        (index >= 0.0 && index <= last).then_some(index as usize)
                    };
                    AxisSample {
                        lo: within(lo),
                        hi: within(lo + 1.0),
                        t: position - lo,
                    }
                }
            }
        })
        .collect()
}

/// Resize a grid to `(rows, cols)` with bilinear interpolation
///
/// A shrinking axis is first smoothed with a Gaussian of standard deviation
/// `(scale - 1) / 2` source pixels, padded the same way as the sampling.
/// Every output value is a convex combination of source values (and the
/// constant fill value in [`Boundary::Constant`] mode), so no new extremes
/// are introduced.
///
/// # Errors
///
/// Returns an error if the source or the requested shape has a zero-sized axis
pub fn resize_bilinear(
    source: ArrayView2<'_, f32>,
    shape: (usize, usize),
    boundary: Boundary,
) -> Result<Array2<f32>, InterpolationError> {
    let (source_rows, source_cols) = source.dim();
    if source_rows == 0 || source_cols == 0 {
        return Err(InterpolationError::new("Source grid has no samples"));
    }
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return Err(InterpolationError::new("Target shape has a zero-sized axis"));
    }

    if (rows, cols) == (source_rows, source_cols) {
        return Ok(source.to_owned());
    }

    let fill = match boundary {
        Boundary::Constant(value) => value,
        Boundary::Edge => 0.0,
    };
    let filtered = anti_alias(source, shape, boundary);
    let row_samples = axis_samples(source_rows, rows, boundary);
    let col_samples = axis_samples(source_cols, cols, boundary);

    let read = |r: Option<usize>, c: Option<usize>| -> f32 {
        match (r, c) {
            (Some(r), Some(c)) => filtered.get((r, c)).copied().unwrap_or(fill),
            _ => fill,
        }
    };

    Ok(Array2::from_shape_fn((rows, cols), |(y, x)| {
        let ry = row_samples.get(y).copied().unwrap_or_default();
        let cx = col_samples.get(x).copied().unwrap_or_default();

        let top = cx.t.mul_add(read(ry.lo, cx.hi) - read(ry.lo, cx.lo), read(ry.lo, cx.lo));
        let bottom = cx.t.mul_add(read(ry.hi, cx.hi) - read(ry.hi, cx.lo), read(ry.hi, cx.lo));
        ry.t.mul_add(bottom - top, top)
    }))
}
