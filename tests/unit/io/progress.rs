//! Tests for the stage spinner

#[cfg(test)]
mod tests {
    use chestscan::io::progress::StageProgress;
    use chestscan::pipeline::orchestrator::PipelineStage;

    // Tests the observer accepts a full run of stage transitions
    #[test]
    fn test_observer_follows_stages() {
        let progress = StageProgress::new("scan.png");
        let mut observer = progress.observer();

        for stage in [
            PipelineStage::Idle,
            PipelineStage::Preprocessing,
            PipelineStage::Inferring,
            PipelineStage::AttributingSaliency,
            PipelineStage::Fusing,
            PipelineStage::Complete,
        ] {
            observer(stage);
        }
        progress.finish();
    }

    // Tests failed analyses abandon the spinner cleanly
    #[test]
    fn test_observer_on_failure() {
        let progress = StageProgress::new("broken.png");
        let mut observer = progress.observer();

        observer(PipelineStage::Preprocessing);
        observer(PipelineStage::Failed);
        progress.finish();
    }
}
