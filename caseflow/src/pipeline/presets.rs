//! The built-in business-case pipeline.

use super::{PipelineBuilder, PipelineDefinition};
use crate::agents::AgentDescriptor;
use crate::errors::PipelineValidationError;

/// Default model for the built-in pipeline.
pub const DEFAULT_MODEL_ID: &str = "gemini-2.0-flash";

/// Name of the built-in pipeline.
pub const AUTOMATION_PIPELINE: &str = "automation_business_case";

const PROCESS_ANALYSIS: &str = "\
Analyse the process below as a process analysis specialist.

Scenario: {business_scenario}
Challenge: {business_challenge}
Current state: {current_state}
Success looks like: {success_definition}
Frequency: {process_frequency}; monthly volume: {monthly_volume}; \
people involved: {people_involved}; manual effort: {manual_percentage}%
Decision makers: {decision_makers}
Affected departments: {affected_departments}
Context: {business_context}
Customer experience objective: {cx_objective}

Describe the current workflow, its bottlenecks and the automation potential of each step.";

const ROI_ANALYSIS: &str = "\
Using the process analysis below, estimate the financial case for automation: \
monthly and annual savings, implementation cost, ROI and payback period. \
State your assumptions.

Process analysis:
{process_analysis}";

const IMPLEMENTATION_PLAN: &str = "\
Draft a phased implementation plan for {business_scenario}.

Process analysis:
{process_analysis}

Financial case:
{roi_analysis}";

const RISK_ASSESSMENT: &str = "\
Assess the delivery risks of the plan below and propose mitigations.

Process analysis:
{process_analysis}

Financial case:
{roi_analysis}

Implementation plan:
{implementation_plan}";

const TECH_INTEGRATION: &str = "\
Recommend the technology and integration approach for the plan below, \
respecting the risks identified.

Process analysis:
{process_analysis}

Financial case:
{roi_analysis}

Implementation plan:
{implementation_plan}

Risks:
{risk_assessment}";

const BUSINESS_CASE: &str = "\
Compile an executive business case for {decision_makers} from the work below. \
Lead with the recommendation, then savings, ROI, roadmap, risks and success metrics.

Process analysis:
{process_analysis}

Financial case:
{roi_analysis}

Implementation plan:
{implementation_plan}

Risks:
{risk_assessment}

Technology:
{tech_integration}";

/// Builds the six-agent automation business-case pipeline.
///
/// # Errors
///
/// Returns a validation error only if the built-in templates are broken.
pub fn automation_business_case(
    model_id: &str,
) -> Result<PipelineDefinition, PipelineValidationError> {
    PipelineBuilder::new(AUTOMATION_PIPELINE)
        .description("Sequential automation business case analysis")
        .request_inputs()
        .agent(
            AgentDescriptor::new("customer_journey_analyst", model_id, PROCESS_ANALYSIS, "process_analysis")
                .with_display_name("Process Analysis Specialist")
                .with_description("Maps the current process and its automation potential"),
        )
        .agent(
            AgentDescriptor::new("data_analytics_specialist", model_id, ROI_ANALYSIS, "roi_analysis")
                .with_display_name("ROI Calculator")
                .with_description("Estimates savings, cost, ROI and payback"),
        )
        .agent(
            AgentDescriptor::new(
                "process_improvement_specialist",
                model_id,
                IMPLEMENTATION_PLAN,
                "implementation_plan",
            )
            .with_display_name("Implementation Planner")
            .with_description("Plans the phased rollout"),
        )
        .agent(
            AgentDescriptor::new("solution_designer", model_id, RISK_ASSESSMENT, "risk_assessment")
                .with_display_name("Risk Assessment Specialist")
                .with_description("Identifies delivery risks and mitigations"),
        )
        .agent(
            AgentDescriptor::new(
                "implementation_strategist",
                model_id,
                TECH_INTEGRATION,
                "tech_integration",
            )
            .with_display_name("Technology Integration Specialist")
            .with_description("Recommends platforms and integration patterns"),
        )
        .agent(
            AgentDescriptor::new(
                "success_metrics_specialist",
                model_id,
                BUSINESS_CASE,
                "final_business_case",
            )
            .with_display_name("Business Case Compiler")
            .with_description("Compiles the executive business case"),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_builds() {
        let pipeline = automation_business_case(DEFAULT_MODEL_ID).unwrap();

        assert_eq!(pipeline.name(), AUTOMATION_PIPELINE);
        assert_eq!(pipeline.len(), 6);
        assert_eq!(
            pipeline.agent_names(),
            vec![
                "customer_journey_analyst",
                "data_analytics_specialist",
                "process_improvement_specialist",
                "solution_designer",
                "implementation_strategist",
                "success_metrics_specialist",
            ]
        );
    }

    #[test]
    fn test_preset_dependencies() {
        let infos = automation_business_case("m").unwrap().describe();

        assert_eq!(infos[1].inputs, vec!["process_analysis".to_string()]);
        assert!(infos[5].inputs.contains(&"tech_integration".to_string()));
        assert_eq!(infos[5].output_key, "final_business_case");
        assert_eq!(infos[0].display_name, "Process Analysis Specialist");
        assert!(infos.iter().all(|info| info.model_id == "m"));
    }
}
