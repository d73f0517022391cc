//! The final business-case report and the code that builds it.
//!
//! [`ResultFormatter`] turns a request (and, when agents ran, their
//! outputs) into a [`Report`]. The arithmetic lives in [`Projection`] and
//! is driven by a [`ProjectionConfig`], so the numeric tables are
//! configuration rather than code. [`Refiner`] applies client feedback to a
//! finished report.

mod formatter;
mod projection;
mod refine;

pub use formatter::ResultFormatter;
pub use projection::{
    ComplexityLevel, CostModel, Projection, ProjectionConfig, RateTable, RateThreshold,
};
pub use refine::{RefinementKind, Refiner};

use serde::{Deserialize, Serialize};

/// Where a report's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Built after a full agent pipeline run.
    Agents,
    /// Synthesised from the request alone.
    Fallback,
}

impl std::fmt::Display for ReportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agents => write!(f, "agents"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// One phase of the implementation roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapPhase {
    /// Stable phase id (`phase_1`, ...).
    pub phase: String,
    /// Title including the month range.
    pub title: String,
    /// Planned actions.
    pub actions: Vec<String>,
    /// Expected impact statement.
    pub expected_impact: String,
}

/// A measurable success criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMetric {
    /// Metric name.
    pub metric: String,
    /// Target value.
    pub target: String,
    /// When the target should be reached.
    pub timeframe: String,
    /// How it is measured.
    pub measurement: String,
}

/// An agent's output as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Agent name.
    pub agent: String,
    /// Human-facing section title.
    pub title: String,
    /// Context key the text was published under.
    pub output_key: String,
    /// Generated text.
    pub content: String,
}

/// The final deliverable of a session.
///
/// Reports are values: refinement produces a new report rather than
/// editing one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Agents or fallback.
    pub source: ReportSource,
    /// The business scenario analysed.
    pub scenario: String,
    /// Derived complexity tier.
    pub complexity_level: ComplexityLevel,
    /// One-paragraph summary.
    pub executive_summary: String,
    /// Display string, e.g. `267%`.
    pub estimated_roi: String,
    /// Display string, e.g. `4.5 months`.
    pub payback_period: String,
    /// Display string, e.g. `$600,000`.
    pub annual_savings: String,
    /// The numbers behind the display strings.
    pub projection: Projection,
    /// Automation opportunities.
    pub opportunities: Vec<String>,
    /// Ordered recommendations.
    pub recommendations: Vec<String>,
    /// Phased roadmap.
    pub roadmap: Vec<RoadmapPhase>,
    /// Success metrics.
    pub success_metrics: Vec<SuccessMetric>,
    /// Risk summary.
    pub risk_assessment: String,
    /// Per-agent sections, in pipeline order. Empty for fallback reports.
    #[serde(default)]
    pub sections: Vec<ReportSection>,
    /// Feedback applied through refinement, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<String>,
}

impl Report {
    /// Returns a roadmap phase by id.
    #[must_use]
    pub fn phase(&self, phase: &str) -> Option<&RoadmapPhase> {
        self.roadmap.iter().find(|p| p.phase == phase)
    }

    /// Returns the section produced under `output_key`.
    #[must_use]
    pub fn section(&self, output_key: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.output_key == output_key)
    }
}
