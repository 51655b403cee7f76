//! Command-line interface for analyzing a single chest X-ray

use crate::io::configuration::{
    AnalysisConfig, DEFAULT_BLOCK_CHANNELS, DEFAULT_REPORT_THRESHOLD, DEFAULT_SEED, FUSED_SUFFIX,
    OVERLAY_SUFFIX, SaliencyTarget, TARGET_RESOLUTION,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::save_overlay;
use crate::io::progress::StageProgress;
use crate::model::engine::InferenceEngine;
use crate::model::network::{Network, NetworkShape};
use crate::model::vocabulary::{default_vocabulary, file_stem};
use crate::pipeline::orchestrator::Pipeline;
use crate::pipeline::report::{ReportCollaborator, TextReport};
use crate::pipeline::result::AnalysisResult;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "chestscan")]
#[command(
    author,
    version,
    about = "Score chest X-ray pathologies and render fused saliency overlays"
)]
/// Command-line arguments for the analysis tool
pub struct Cli {
    /// Chest X-ray image to analyze
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// JSON network weights (a seeded demo network is used when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    /// Directory for overlay images (defaults to the image's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only compute saliency for pathologies at or above the threshold
    #[arg(short, long)]
    pub findings_only: bool,

    /// Probability at which a pathology counts as a finding
    #[arg(short, long, default_value_t = DEFAULT_REPORT_THRESHOLD)]
    pub threshold: f32,

    /// Saliency target: `input`, `last`, or a convolution block index
    #[arg(long, default_value = "last", value_parser = parse_target)]
    pub target: SaliencyTarget,

    /// Seed for the demo network when no weights are given
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Skip writing overlay images
    #[arg(short, long)]
    pub no_overlays: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Runtime options derived from the flags
    pub const fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            report_all: !self.findings_only,
            report_threshold: self.threshold,
            saliency_target: self.target,
        }
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Parse a saliency target flag
///
/// # Errors
///
/// Returns a message if the value is neither `input`, `last` nor an index
pub fn parse_target(value: &str) -> std::result::Result<SaliencyTarget, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "input" => Ok(SaliencyTarget::Input),
        "last" => Ok(SaliencyTarget::LastLayer),
        other => other
            .parse::<usize>()
            .map(SaliencyTarget::Layer)
            .map_err(|_| format!("expected 'input', 'last' or a block index, got '{value}'")),
    }
}

/// Runs one analysis as described by the CLI arguments
pub struct AnalysisRunner {
    cli: Cli,
}

impl AnalysisRunner {
    /// Create a runner for the given CLI arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Analyze the image, print the reports and write the overlays
    ///
    /// # Errors
    ///
    /// Returns an error if the network cannot be built, the analysis fails,
    /// or an overlay cannot be written
    // Reports are the program's output
    #[allow(clippy::print_stdout)]
    pub fn run(&self) -> Result<()> {
        let engine = self.build_engine()?;
        let config = self.cli.analysis_config();

        let mut pipeline = Pipeline::new(engine, &config)?;
        let progress = self.cli.should_show_progress().then(|| {
            StageProgress::new(
                &self
                    .cli
                    .image
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy(),
            )
        });
        if let Some(ref progress) = progress {
            pipeline = pipeline.with_observer(progress.observer());
        }

        let outcome = pipeline.analyze(&self.cli.image);
        if let Some(ref progress) = progress {
            progress.finish();
        }
        let result = outcome?;

        let reporter = TextReport::with_threshold(self.cli.threshold);
        println!("{}", reporter.summary(&result.scores));
        println!();
        print!("{}", reporter.detailed(&result.scores));

        if !self.cli.no_overlays {
            for path in self.write_overlays(&result)? {
                println!("Wrote {}", path.display());
            }
        }

        Ok(())
    }

    fn build_engine(&self) -> Result<InferenceEngine> {
        if let Some(ref weights) = self.cli.weights {
            return InferenceEngine::from_weights_file(weights);
        }

        log::warn!(
            "No weights supplied, using a seeded demo network (seed {}); scores are not clinically meaningful",
            self.cli.seed
        );
        let shape = NetworkShape {
            resolution: TARGET_RESOLUTION,
            block_channels: DEFAULT_BLOCK_CHANNELS.to_vec(),
        };
        let network = Network::seeded(default_vocabulary(), &shape, self.cli.seed)?;
        Ok(InferenceEngine::new(network))
    }

    fn write_overlays(&self, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(result.overlays.len() + 1);

        let fused_path = self.fused_path()?;
        save_overlay(&result.fused, &fused_path)?;
        written.push(fused_path);

        for (name, overlay) in result.ordered_overlays() {
            let path = self.overlay_path(name)?;
            save_overlay(overlay, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    fn output_dir(&self) -> PathBuf {
        self.cli.output_dir.clone().unwrap_or_else(|| {
            self.cli
                .image
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf)
        })
    }

    fn image_stem(&self) -> Result<String> {
        self.cli
            .image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                invalid_parameter(
                    "image",
                    &self.cli.image.display(),
                    &"path has no file name",
                )
            })
    }

    /// Destination of the fused overlay
    ///
    /// # Errors
    ///
    /// Returns an error if the image path has no file name
    pub fn fused_path(&self) -> Result<PathBuf> {
        Ok(self
            .output_dir()
            .join(format!("{}{FUSED_SUFFIX}.png", self.image_stem()?)))
    }

    /// Destination of one pathology's overlay
    ///
    /// # Errors
    ///
    /// Returns an error if the image path has no file name
    pub fn overlay_path(&self, pathology: &str) -> Result<PathBuf> {
        Ok(self.output_dir().join(format!(
            "{}{OVERLAY_SUFFIX}_{}.png",
            self.image_stem()?,
            file_stem(pathology)
        )))
    }
}
