//! Tests for bilinear resampling and boundary handling

#[cfg(test)]
mod tests {
    use chestscan::math::interpolation::{Boundary, anti_alias_sigma, resize_bilinear};
    use ndarray::{Array2, array};

    // Tests same-size resize returns the input unchanged
    #[test]
    fn test_identity_resize() {
        let source = array![[1.0f32, 2.0], [3.0, 4.0]];
        let resized =
            resize_bilinear(source.view(), (2, 2), Boundary::Constant(0.0)).expect("resize");

        assert_eq!(resized, source);
    }

    // Tests constant grids stay constant when upsampled with edge clamping
    #[test]
    fn test_edge_upsample_preserves_constant() {
        let source = Array2::from_elem((3, 5), 0.75f32);
        let resized = resize_bilinear(source.view(), (12, 20), Boundary::Edge).expect("resize");

        assert_eq!(resized.dim(), (12, 20));
        assert!(resized.iter().all(|&v| (v - 0.75).abs() < 1e-6));
    }

    // Tests constant mode blends border samples with the fill value
    #[test]
    fn test_constant_mode_reads_fill_outside() {
        let source = Array2::from_elem((2, 2), 1.0f32);
        let resized =
            resize_bilinear(source.view(), (4, 4), Boundary::Constant(0.0)).expect("resize");

        let corner = resized.get((0, 0)).copied().unwrap_or(f32::NAN);
        let center = resized.get((1, 1)).copied().unwrap_or(f32::NAN);
        assert!(corner < 1.0, "corner should mix in the fill value, got {corner}");
        assert!((center - 1.0).abs() < 1e-6);
    }

    // Tests upsampled values never leave the source range
    #[test]
    fn test_upsample_stays_within_source_range() {
        let source = array![[0.0f32, 1.0, 0.2], [0.9, 0.1, 0.5], [0.3, 0.7, 1.0]];
        let resized = resize_bilinear(source.view(), (31, 17), Boundary::Edge).expect("resize");

        assert!(resized.iter().all(|&v| (-1e-6..=1.0 + 1e-6).contains(&v)));
    }

    // Tests constant grids stay constant when shrunk with edge clamping
    #[test]
    fn test_edge_downsample_preserves_constant() {
        let source = Array2::from_elem((40, 30), -0.5f32);
        let resized = resize_bilinear(source.view(), (4, 7), Boundary::Edge).expect("resize");

        assert_eq!(resized.dim(), (4, 7));
        assert!(resized.iter().all(|&v| (v + 0.5).abs() < 1e-5));
    }

    // Tests thin stripes shrink to their average instead of aliasing
    #[test]
    fn test_downsampled_stripes_average_out() {
        // Two bright columns in every ten, sampled right on top of them
        let source = Array2::from_shape_fn((1, 400), |(_, x)| {
            if matches!(x % 10, 4 | 5) { 1.0f32 } else { 0.0 }
        });
        let resized = resize_bilinear(source.view(), (1, 40), Boundary::Edge).expect("resize");

        for col in 3..37 {
            let value = resized.get((0, col)).copied().unwrap_or(f32::NAN);
            assert!((value - 0.2).abs() < 0.02, "column {col} was {value}");
        }
    }

    // Tests shrinking also stays within the source range
    #[test]
    fn test_downsample_stays_within_source_range() {
        let source = Array2::from_shape_fn((37, 53), |(y, x)| ((y * 7 + x * 3) % 11) as f32 / 10.0);
        let resized = resize_bilinear(source.view(), (9, 5), Boundary::Edge).expect("resize");

        assert!(resized.iter().all(|&v| (-1e-6..=1.0 + 1e-6).contains(&v)));
    }

    // Tests smoothing strength follows the shrink factor and skips growing axes
    #[test]
    fn test_anti_alias_sigma() {
        assert_eq!(anti_alias_sigma(224, 224), 0.0);
        assert_eq!(anti_alias_sigma(16, 224), 0.0);
        assert!((anti_alias_sigma(30, 10) - 1.0).abs() < 1e-6);
        assert!((anti_alias_sigma(2240, 224) - 4.5).abs() < 1e-5);
    }

    // Tests zero-sized inputs and targets are rejected
    #[test]
    fn test_zero_sized_axes_fail() {
        let empty = Array2::<f32>::zeros((0, 4));
        assert!(resize_bilinear(empty.view(), (2, 2), Boundary::Edge).is_err());

        let source = Array2::<f32>::ones((2, 2));
        assert!(resize_bilinear(source.view(), (0, 2), Boundary::Edge).is_err());
    }
}
