//! Report assembly.

use super::{
    ComplexityLevel, Projection, ProjectionConfig, Report, ReportSection, ReportSource,
    RoadmapPhase, SuccessMetric,
};
use crate::context::{ExecutionContext, RequestParameters};
use crate::errors::InvalidProjection;
use crate::pipeline::PipelineDefinition;
use crate::utils::{format_count, format_currency, format_thousands};

const OPPORTUNITIES: [&str; 5] = [
    "Automate manual processing steps to shorten cycle time",
    "Integrate the systems involved so data moves without re-keying",
    "Standardise the process to remove variation between handlers",
    "Add real-time monitoring and automated reporting for visibility",
    "Design for growth so volume can rise without adding headcount",
];

const RECOMMENDATIONS: [&str; 5] = [
    "Start with a pilot to validate the approach before a wider rollout",
    "Run a change management programme with named stakeholders",
    "Track performance on a dashboard and tune continuously",
    "Set up a governance framework for operating and extending automation",
    "Train users and build a super-user network to drive adoption",
];

/// Builds reports from requests and agent outputs.
///
/// Formatting is pure: the same inputs always serialize to the same bytes.
#[derive(Debug, Clone, Default)]
pub struct ResultFormatter {
    config: ProjectionConfig,
}

impl ResultFormatter {
    /// Creates a formatter with the given projection tables.
    #[must_use]
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Returns the projection tables.
    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Builds the report after a pipeline run.
    ///
    /// Each agent whose output is in `ctx` contributes a section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProjection` if the request's numbers do not project.
    pub fn format(
        &self,
        pipeline: &PipelineDefinition,
        ctx: &ExecutionContext,
        request: &RequestParameters,
    ) -> Result<Report, InvalidProjection> {
        let sections = pipeline
            .agents()
            .iter()
            .filter_map(|agent| {
                ctx.get(agent.output_key()).map(|content| ReportSection {
                    agent: agent.name().to_string(),
                    title: agent.display_name().to_string(),
                    output_key: agent.output_key().to_string(),
                    content: content.to_string(),
                })
            })
            .collect();
        self.build(request, ReportSource::Agents, sections)
    }

    /// Synthesises the report from the request alone.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProjection` if the request's numbers do not project.
    pub fn fallback(&self, request: &RequestParameters) -> Result<Report, InvalidProjection> {
        self.build(request, ReportSource::Fallback, Vec::new())
    }

    fn build(
        &self,
        request: &RequestParameters,
        source: ReportSource,
        sections: Vec<ReportSection>,
    ) -> Result<Report, InvalidProjection> {
        let projection = Projection::compute(&self.config, request)?;

        let executive_summary = format!(
            "Automation analysis for {} covers {} monthly transactions handled by {} people at {}% manual effort. \
             Projected ROI of {:.0}% with a {:.1} month payback period supports the investment.",
            request.business_scenario,
            format_count(request.monthly_volume),
            request.people_involved,
            request.manual_percentage,
            projection.roi_percentage,
            projection.payback_months,
        );

        let risk_assessment = format!(
            "Medium risk implementation with a {:.1} month payback period. The main risks are user adoption \
             and integration complexity; a phased rollout with change management and thorough testing mitigates them.",
            projection.payback_months
        );

        Ok(Report {
            source,
            scenario: request.business_scenario.clone(),
            complexity_level: ComplexityLevel::assess(request),
            executive_summary,
            estimated_roi: format!("{:.0}%", projection.roi_percentage),
            payback_period: format!("{:.1} months", projection.payback_months),
            annual_savings: format_currency(projection.annual_savings),
            opportunities: strings(&OPPORTUNITIES),
            recommendations: strings(&RECOMMENDATIONS),
            roadmap: roadmap(&projection),
            success_metrics: success_metrics(request, &projection),
            risk_assessment,
            projection,
            sections,
            refinements: Vec::new(),
        })
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn roadmap(projection: &Projection) -> Vec<RoadmapPhase> {
    vec![
        RoadmapPhase {
            phase: "phase_1".to_string(),
            title: "Foundation & Planning (Months 1-2)".to_string(),
            actions: strings(&[
                "Agree the project charter with stakeholders",
                "Document the current process and gather requirements",
                "Evaluate technology options and select vendors",
                "Prepare the change management and communication plan",
            ]),
            expected_impact: "Foundation in place with an agreed roadmap and stakeholder support"
                .to_string(),
        },
        RoadmapPhase {
            phase: "phase_2".to_string(),
            title: "Development & Integration (Months 3-5)".to_string(),
            actions: strings(&[
                "Configure the automation platform and build workflows",
                "Integrate with existing systems and APIs",
                "Test end to end, including user acceptance",
                "Prepare training material and pilot users",
            ]),
            expected_impact: format!(
                "Automation ready for deployment, targeting {} monthly savings",
                format_thousands(projection.monthly_savings * 0.3)
            ),
        },
        RoadmapPhase {
            phase: "phase_3".to_string(),
            title: "Deployment & Optimization (Months 6-8)".to_string(),
            actions: strings(&[
                "Deploy to production in phases",
                "Run the training and adoption programme",
                "Monitor performance and optimise",
                "Establish continuous improvement and plan scaling",
            ]),
            expected_impact: format!(
                "Automation in full operation delivering the projected {} monthly savings",
                format_currency(projection.monthly_savings)
            ),
        },
    ]
}

fn success_metrics(request: &RequestParameters, projection: &Projection) -> Vec<SuccessMetric> {
    let metric = |metric: &str, target: String, timeframe: &str, measurement: &str| SuccessMetric {
        metric: metric.to_string(),
        target,
        timeframe: timeframe.to_string(),
        measurement: measurement.to_string(),
    };
    vec![
        metric(
            "Process Efficiency Improvement",
            format!(
                "{}% time reduction",
                (85 - i32::from(request.manual_percentage)).max(0)
            ),
            "6 months post-deployment",
            "Average processing time per transaction against the baseline",
        ),
        metric(
            "Cost Savings Achievement",
            format!("{} annually", format_currency(projection.annual_savings)),
            "12 months post-deployment",
            "Monthly cost tracking against baseline operating costs",
        ),
        metric(
            "Error Rate Reduction",
            "90% fewer processing errors".to_string(),
            "6 months post-deployment",
            "Error rate and quality metrics dashboard",
        ),
        metric(
            "User Adoption Rate",
            "95% automation utilization".to_string(),
            "9 months post-deployment",
            "Share of transactions processed through automated workflows",
        ),
    ]
}
