//! Tests for the network input tensor contract

#[cfg(test)]
mod tests {
    use chestscan::DiagnosticError;
    use chestscan::imaging::tensor::NormalizedTensor;
    use ndarray::{Array2, array};

    // Tests square finite grids are accepted and reported back intact
    #[test]
    fn test_square_grid_is_accepted() {
        let grid = array![[-1024.0f32, 0.0], [512.0, 1024.0]];
        let tensor = NormalizedTensor::from_array(grid.clone()).expect("tensor");

        assert_eq!(tensor.resolution(), 2);
        assert_eq!(tensor.view(), grid.view());
        assert_eq!(tensor.into_inner(), grid);
    }

    // Tests non-square, empty and non-finite grids are invalid images
    #[test]
    fn test_invalid_grids_are_rejected() {
        let cases = [
            Array2::<f32>::zeros((2, 3)),
            Array2::<f32>::zeros((0, 0)),
            array![[0.0f32, f32::NAN], [0.0, 0.0]],
            array![[f32::INFINITY]],
        ];

        for grid in cases {
            assert!(matches!(
                NormalizedTensor::from_array(grid),
                Err(DiagnosticError::InvalidImage { .. })
            ));
        }
    }
}
