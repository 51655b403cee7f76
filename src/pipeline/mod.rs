//! Analysis orchestration, results and reporting

/// Stage state machine sequencing the components
pub mod orchestrator;
/// Text reports built from scores
pub mod report;
/// Aggregate analysis output
pub mod result;

pub use orchestrator::{Pipeline, PipelineStage};
pub use report::{ReportCollaborator, TextReport};
pub use result::AnalysisResult;
