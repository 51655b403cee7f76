//! Spinner tracking the stages of one analysis

use crate::pipeline::orchestrator::{PipelineStage, StageObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} [{elapsed_precise}] {prefix} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
});

/// Reports pipeline stage transitions on the terminal
pub struct StageProgress {
    bar: ProgressBar,
}

impl StageProgress {
    /// Start a spinner labelled with the analyzed file's name
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Observer that mirrors stage transitions onto this spinner
    pub fn observer(&self) -> StageObserver {
        let bar = self.bar.clone();
        Box::new(move |stage: PipelineStage| match stage {
            PipelineStage::Complete => bar.finish_with_message("done"),
            PipelineStage::Failed => bar.abandon_with_message("failed"),
            other => bar.set_message(other.label()),
        })
    }

    /// Clear the spinner from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
