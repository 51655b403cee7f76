//! Tests for min-max normalization of attribution grids

#[cfg(test)]
mod tests {
    use chestscan::math::normalization::{finite_range, min_max_normalize};
    use ndarray::{Array2, array};

    // Tests output spans exactly [0, 1]
    #[test]
    fn test_min_max_normalize_spans_unit_interval() {
        let values = array![[2.0f32, 4.0], [6.0, 10.0]];
        let normalized = min_max_normalize(values.view());

        assert_eq!(normalized, array![[0.0, 0.25], [0.5, 1.0]]);
    }

    // Tests constant grids normalize to zeros
    #[test]
    fn test_constant_grid_is_all_zero() {
        let values = Array2::from_elem((3, 3), 7.5f32);
        let normalized = min_max_normalize(values.view());

        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    // Tests non-finite entries are ignored for the range and mapped to zero
    #[test]
    fn test_non_finite_values_are_zeroed() {
        let values = array![[f32::NAN, 1.0], [3.0, f32::INFINITY]];
        assert_eq!(finite_range(values.view()), Some((1.0, 3.0)));

        let normalized = min_max_normalize(values.view());
        assert_eq!(normalized, array![[0.0, 0.0], [1.0, 0.0]]);
    }

    // Tests negative inputs are shifted rather than clipped
    #[test]
    fn test_negative_values_are_shifted() {
        let values = array![[-4.0f64, 0.0, 4.0]];
        let normalized = min_max_normalize(values.view());

        assert_eq!(normalized, array![[0.0, 0.5, 1.0]]);
    }

    // Tests small-magnitude grids keep their structure
    #[test]
    fn test_tiny_values_are_not_flat() {
        let values = array![[0.0f32, 2.0e-7], [4.0e-7, 8.0e-7]];
        let normalized = min_max_normalize(values.view());

        assert!((normalized.get((1, 1)).copied().unwrap_or(0.0) - 1.0).abs() < 1e-6);
        assert!((normalized.get((1, 0)).copied().unwrap_or(0.0) - 0.5).abs() < 1e-6);
    }
}
