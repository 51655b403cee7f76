//! Tests for command-line parsing and the analysis runner

#[cfg(test)]
mod tests {
    use crate::{detector_network, gray_image};
    use chestscan::io::cli::{AnalysisRunner, Cli, parse_target};
    use chestscan::io::configuration::{DEFAULT_REPORT_THRESHOLD, DEFAULT_SEED, SaliencyTarget};
    use clap::Parser;
    use std::path::PathBuf;

    // Tests CLI parsing with only the required image argument
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(["program", "chest.png"]);

        assert_eq!(cli.image, PathBuf::from("chest.png"));
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert!((cli.threshold - DEFAULT_REPORT_THRESHOLD).abs() < f32::EPSILON);
        assert_eq!(cli.target, SaliencyTarget::LastLayer);
        assert!(cli.weights.is_none());
        assert!(cli.should_show_progress());

        let config = cli.analysis_config();
        assert!(config.report_all);
        assert!(config.validate().is_ok());
    }

    // Tests every flag reaches the analysis configuration
    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "program",
            "chest.png",
            "--weights",
            "net.json",
            "--output-dir",
            "out",
            "--findings-only",
            "--threshold",
            "0.7",
            "--target",
            "input",
            "--seed",
            "9",
            "--no-overlays",
            "--quiet",
        ]);

        assert_eq!(cli.weights, Some(PathBuf::from("net.json")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert!(cli.no_overlays);
        assert!(!cli.should_show_progress());

        let config = cli.analysis_config();
        assert!(!config.report_all);
        assert!((config.report_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.saliency_target, SaliencyTarget::Input);
    }

    // Tests saliency target spellings
    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("input"), Ok(SaliencyTarget::Input));
        assert_eq!(parse_target("LAST"), Ok(SaliencyTarget::LastLayer));
        assert_eq!(parse_target("2"), Ok(SaliencyTarget::Layer(2)));
        assert!(parse_target("penultimate").is_err());
        assert!(Cli::try_parse_from(["program", "chest.png", "--target", "-1"]).is_err());
    }

    // Tests overlay names derive from the image stem and pathology
    #[test]
    fn test_output_paths() {
        let runner = AnalysisRunner::new(Cli::parse_from([
            "program",
            "scans/patient 7.png",
            "-o",
            "results",
        ]));

        assert_eq!(
            runner.fused_path().expect("fused path"),
            PathBuf::from("results/patient 7_fused.png")
        );
        assert_eq!(
            runner.overlay_path("Pleural_Thickening").expect("overlay path"),
            PathBuf::from("results/patient 7_overlay_pleural_thickening.png")
        );

        let beside = AnalysisRunner::new(Cli::parse_from(["program", "scans/a.png"]));
        assert_eq!(
            beside.fused_path().expect("fused path"),
            PathBuf::from("scans/a_fused.png")
        );
    }

    // Tests a full run writes the fused and per-pathology overlays
    #[test]
    fn test_run_writes_overlays() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image_path = dir.path().join("scan.png");
        gray_image(24, 24, |x, _| if x < 12 { 30 } else { 220 })
            .save(&image_path)
            .expect("save image");
        let weights_path = dir.path().join("detector.json");
        detector_network(16)
            .to_weights()
            .save(&weights_path)
            .expect("save weights");
        let output = dir.path().join("out");

        let cli = Cli::parse_from([
            "program".into(),
            image_path.into_os_string(),
            "--weights".into(),
            weights_path.into_os_string(),
            "--output-dir".into(),
            output.clone().into_os_string(),
            "--quiet".into(),
        ]);
        AnalysisRunner::new(cli).run().expect("run");

        assert!(output.join("scan_fused.png").is_file());
        assert!(output.join("scan_overlay_brightness.png").is_file());
        assert!(output.join("scan_overlay_darkness.png").is_file());
    }
}
