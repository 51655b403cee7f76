//! Plain text summaries of pathology scores

use crate::io::configuration::{DEFAULT_REPORT_THRESHOLD, URGENT_FINDING_THRESHOLD};
use crate::model::scores::PathologyScores;
use std::fmt::Write;

/// Turns pathology scores into human readable text
pub trait ReportCollaborator {
    /// One or two line overview of the findings
    fn summary(&self, scores: &PathologyScores) -> String;

    /// Full per-pathology report
    fn detailed(&self, scores: &PathologyScores) -> String;
}

/// Likelihood band of a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingLevel {
    /// At or above the urgent threshold
    Urgent,
    /// At or above the report threshold
    Elevated,
    /// Below the report threshold
    Low,
}

impl FindingLevel {
    const fn label(self) -> &'static str {
        match self {
            Self::Urgent => "URGENT",
            Self::Elevated => "elevated",
            Self::Low => "low",
        }
    }
}

/// Plain text report with fixed thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextReport {
    report_threshold: f32,
    urgent_threshold: f32,
}

impl Default for TextReport {
    fn default() -> Self {
        Self {
            report_threshold: DEFAULT_REPORT_THRESHOLD,
            urgent_threshold: URGENT_FINDING_THRESHOLD,
        }
    }
}

impl TextReport {
    /// Report using the given finding threshold and the default urgent threshold
    pub fn with_threshold(report_threshold: f32) -> Self {
        Self {
            report_threshold,
            urgent_threshold: URGENT_FINDING_THRESHOLD.max(report_threshold),
        }
    }

    /// Band a score falls into
    pub fn level(&self, probability: f32) -> FindingLevel {
        if probability >= self.urgent_threshold {
            FindingLevel::Urgent
        } else if probability >= self.report_threshold {
            FindingLevel::Elevated
        } else {
            FindingLevel::Low
        }
    }
}

impl ReportCollaborator for TextReport {
    fn summary(&self, scores: &PathologyScores) -> String {
        let findings = scores.findings(self.report_threshold);
        if findings.is_empty() {
            return scores.sorted_descending().first().map_or_else(
                || "No pathologies scored".to_string(),
                |top| {
                    let p = scores.get(top).unwrap_or(0.0);
                    format!(
                        "No significant findings (highest: {top} at {:.1}%)",
                        p * 100.0
                    )
                },
            );
        }

        let listed = findings
            .iter()
            .map(|(name, p)| format!("{name} {:.1}%", p * 100.0))
            .collect::<Vec<_>>()
            .join(", ");
        let urgent = findings
            .iter()
            .filter(|(_, p)| self.level(*p) == FindingLevel::Urgent)
            .count();

        let mut summary = format!("{} finding(s): {listed}", findings.len());
        if urgent > 0 {
            let _ = write!(
                summary,
                "\nALERT: {urgent} finding(s) above {:.0}% need prompt review",
                self.urgent_threshold * 100.0
            );
        }
        summary
    }

    fn detailed(&self, scores: &PathologyScores) -> String {
        let width = scores
            .names()
            .iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0);

        let mut report = String::from("Chest X-ray pathology scores\n");
        let _ = writeln!(report, "{}", "=".repeat(width + 20));
        for name in scores.sorted_descending() {
            let p = scores.get(&name).unwrap_or(0.0);
            let _ = writeln!(
                report,
                "{name:<width$}  {:>6.1}%  {}",
                p * 100.0,
                self.level(p).label()
            );
        }
        let _ = writeln!(report, "{}", "=".repeat(width + 20));
        let _ = writeln!(
            report,
            "Findings at or above {:.0}%: {}",
            self.report_threshold * 100.0,
            scores.findings(self.report_threshold).len()
        );
        report.push_str(
            "Scores are screening aids from an automated model and are not a diagnosis.\n",
        );
        report
    }
}
