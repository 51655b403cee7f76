//! Tests for the classifier's forward pass, gradient tape and backward pass

#[cfg(test)]
mod tests {
    use crate::{BRIGHT, DARK, detector_network, small_network};
    use chestscan::DiagnosticError;
    use chestscan::imaging::tensor::NormalizedTensor;
    use chestscan::model::layers::ConvBlock;
    use chestscan::model::network::{Attribution, GradientSite, Network};
    use ndarray::{Array1, Array2, Array4};

    fn vocabulary(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{i}")).collect()
    }

    fn tensor(side: usize, value: impl Fn(usize, usize) -> f32) -> NormalizedTensor {
        NormalizedTensor::from_array(Array2::from_shape_fn((side, side), |(y, x)| value(y, x)))
            .expect("tensor")
    }

    // Two blocks with strictly positive weights so every unit stays active
    fn positive_network() -> Network {
        let first = Array4::from_shape_fn((2, 1, 3, 3), |(o, _, y, x)| {
            0.05 * (o as f32 + 1.0) + 0.02 * y as f32 + 0.01 * x as f32
        });
        let second = Array4::from_shape_fn((3, 2, 3, 3), |(o, i, y, x)| {
            0.03 + 0.01 * (o + 2 * i) as f32 + 0.005 * (y * 3 + x) as f32
        });
        let blocks = vec![
            ConvBlock::new(first, Array1::from(vec![0.1, 0.2]), true).expect("block"),
            ConvBlock::new(second, Array1::from(vec![0.1, 0.1, 0.1]), false).expect("block"),
        ];
        let head = Array2::from_shape_vec((2, 3), vec![0.5, -0.25, 1.0, -1.0, 0.75, 0.2])
            .expect("head");

        Network::new(
            vocabulary(2),
            8,
            1.0 / 1024.0,
            blocks,
            head,
            Array1::from(vec![0.0, 0.1]),
        )
        .expect("network")
    }

    // Tests construction rejects inconsistent layouts
    #[test]
    fn test_network_validation() {
        let block = || ConvBlock::new(Array4::zeros((2, 1, 3, 3)), Array1::zeros(2), true);
        let head = || Array2::zeros((3, 2));

        assert!(Network::new(vec![], 8, 1.0, vec![block().expect("b")], Array2::zeros((0, 2)), Array1::zeros(0)).is_err());
        assert!(Network::new(vocabulary(3), 8, 1.0, vec![], head(), Array1::zeros(3)).is_err());
        assert!(Network::new(vocabulary(3), 8, 0.0, vec![block().expect("b")], head(), Array1::zeros(3)).is_err());
        assert!(Network::new(vocabulary(3), 8, 1.0, vec![block().expect("b")], Array2::zeros((3, 4)), Array1::zeros(3)).is_err());
        assert!(Network::new(vocabulary(3), 8, 1.0, vec![block().expect("b")], head(), Array1::zeros(2)).is_err());
        assert!(Network::new(vocabulary(3), 1, 1.0, vec![block().expect("b")], head(), Array1::zeros(3)).is_err());

        let duplicate = vec!["A".to_string(), "A".to_string(), "B".to_string()];
        assert!(Network::new(duplicate, 8, 1.0, vec![block().expect("b")], head(), Array1::zeros(3)).is_err());

        // Second block expects 3 channels but the first produces 2
        let mismatched = ConvBlock::new(Array4::zeros((2, 3, 3, 3)), Array1::zeros(2), false);
        assert!(Network::new(
            vocabulary(3),
            8,
            1.0,
            vec![block().expect("b"), mismatched.expect("b")],
            head(),
            Array1::zeros(3)
        )
        .is_err());
    }

    // Tests seeded networks are reproducible and seed dependent
    #[test]
    fn test_seeded_networks_are_deterministic() {
        let input = tensor(16, |y, x| ((y * 16 + x) as f32).sin() * 900.0);

        let a = small_network(16, vocabulary(4), 3);
        let b = small_network(16, vocabulary(4), 3);
        let c = small_network(16, vocabulary(4), 4);

        let la = a.logits(&input).expect("logits");
        assert_eq!(la, b.logits(&input).expect("logits"));
        assert_ne!(la, c.logits(&input).expect("logits"));
    }

    // Tests probabilities are independent sigmoids in [0, 1]
    #[test]
    fn test_probabilities_are_independent_sigmoids() {
        let network = small_network(16, vocabulary(5), 11);
        let input = tensor(16, |y, x| if (y + x) % 3 == 0 { 1024.0 } else { -512.0 });

        let probabilities = network.probabilities(&input).expect("probabilities");
        assert_eq!(probabilities.len(), 5);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        // Multi-label: no normalization across classes
        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() > 1e-3);
    }

    // Tests the bright detector scores bright images higher than dark ones
    #[test]
    fn test_detector_network_responds_to_brightness() {
        let network = detector_network(8);
        let bright = network
            .probabilities(&tensor(8, |_, _| 1024.0))
            .expect("probabilities");
        let dark = network
            .probabilities(&tensor(8, |_, _| -1024.0))
            .expect("probabilities");

        assert_eq!(network.vocabulary(), [BRIGHT.to_string(), DARK.to_string()]);
        assert!(bright.first() > dark.first());
        assert!(dark.get(1) > bright.get(1));
    }

    // Tests tensors of the wrong resolution are an inference error, not a resize
    #[test]
    fn test_resolution_mismatch_is_inference_error() {
        let network = small_network(16, vocabulary(2), 1);
        let result = network.logits(&tensor(15, |_, _| 0.0));

        assert!(matches!(result, Err(DiagnosticError::Inference { .. })));
    }

    // Tests the tape lifecycle and that logits match between recorded and plain passes
    #[test]
    fn test_record_and_clear_tape() {
        let mut network = small_network(16, vocabulary(2), 5);
        let input = tensor(16, |y, _| y as f32 * 50.0);

        assert!(!network.has_tape());
        assert!(network.backward(0, GradientSite::Input).is_err());

        let recorded = network.record(&input).expect("record");
        assert!(network.has_tape());
        assert_eq!(recorded, network.logits(&input).expect("logits"));

        network.clear_tape();
        assert!(!network.has_tape());
    }

    // Tests disabling gradient tracking blocks recording and drops the tape
    #[test]
    fn test_gradient_tracking_toggle() {
        let mut network = small_network(16, vocabulary(2), 5);
        let input = tensor(16, |_, _| 100.0);

        network.record(&input).expect("record");
        network.set_gradient_tracking(false);
        assert!(!network.has_tape());
        assert!(!network.gradient_tracking());
        assert!(network.record(&input).is_err());

        // Plain inference still works without tracking
        assert!(network.logits(&input).is_ok());
    }

    // Tests the input gradient against central finite differences
    // Every unit stays active, so the logit is affine in the input and a wide step is exact
    #[test]
    fn test_input_gradient_matches_finite_differences() {
        let mut network = positive_network();
        let input = tensor(8, |y, x| 100.0 + 60.0 * y as f32 + 15.0 * x as f32);

        network.record(&input).expect("record");
        for class in 0..2 {
            let Attribution::Input { gradient } =
                network.backward(class, GradientSite::Input).expect("backward")
            else {
                unreachable!("input site yields an input attribution");
            };
            assert_eq!(gradient.dim(), (8, 8));

            for &(y, x) in &[(0usize, 0usize), (3, 4), (7, 7), (5, 1), (0, 6)] {
                let eps = 64.0;
                let shifted = |delta: f32| {
                    let mut values = input.view().to_owned();
                    if let Some(v) = values.get_mut((y, x)) {
                        *v += delta;
                    }
                    let perturbed = NormalizedTensor::from_array(values).expect("tensor");
                    network
                        .logits(&perturbed)
                        .expect("logits")
                        .get(class)
                        .copied()
                        .unwrap_or(f32::NAN)
                };
                let numeric = (shifted(eps) - shifted(-eps)) / (2.0 * eps);
                let analytic = gradient.get((y, x)).copied().unwrap_or(f32::NAN);

                assert!(
                    (numeric - analytic).abs() <= 1e-9 + 0.01 * analytic.abs(),
                    "class {class} at ({y}, {x}): numeric {numeric} vs analytic {analytic}"
                );
            }
        }
    }

    // Tests the last block gradient equals the head weight spread over the feature map
    #[test]
    fn test_last_block_gradient_is_head_weight_over_area() {
        let mut network = positive_network();
        network.record(&tensor(8, |_, _| 300.0)).expect("record");

        let Attribution::Block {
            activation,
            gradient,
        } = network.backward(1, GradientSite::Block(1)).expect("backward")
        else {
            unreachable!("block site yields a block attribution");
        };

        assert_eq!(activation.dim(), (3, 4, 4));
        assert_eq!(gradient.dim(), (3, 4, 4));
        for (channel, expected) in [(0usize, -1.0f32), (1, 0.75), (2, 0.2)] {
            let value = gradient.get((channel, 2, 3)).copied().unwrap_or(f32::NAN);
            assert!((value - expected / 16.0).abs() < 1e-7);
        }
    }

    // Tests out-of-range class and block indices are rejected
    #[test]
    fn test_backward_rejects_bad_indices() {
        let mut network = positive_network();
        network.record(&tensor(8, |_, _| 0.0)).expect("record");

        assert!(network.backward(2, GradientSite::Input).is_err());
        assert!(network.backward(0, GradientSite::Block(2)).is_err());
        assert!(network.backward(0, GradientSite::Block(0)).is_ok());
    }

    // Tests weights survive conversion to their serializable form
    #[test]
    fn test_weights_round_trip_preserves_logits() {
        let network = small_network(16, vocabulary(3), 21);
        let rebuilt = Network::from_weights(network.to_weights()).expect("rebuild");
        let input = tensor(16, |y, x| (y as f32 - x as f32) * 40.0);

        assert_eq!(
            network.logits(&input).expect("logits"),
            rebuilt.logits(&input).expect("logits")
        );
    }
}
