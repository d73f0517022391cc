//! Request parameters submitted by callers.

use super::ExecutionContext;
use crate::errors::CaseflowError;
use serde::{Deserialize, Serialize};

/// Business and process metrics for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameters {
    /// The business problem being addressed.
    pub business_challenge: String,
    /// How the process runs today.
    pub current_state: String,
    /// What success looks like.
    pub success_definition: String,
    /// How often the process runs (e.g. "daily").
    pub process_frequency: String,
    /// Transactions handled per month.
    pub monthly_volume: u64,
    /// Staff touching the process.
    pub people_involved: u32,
    /// Share of the process done by hand, 0..=100.
    pub manual_percentage: u8,
    /// Scenario label the analysis is framed around.
    pub business_scenario: String,
    /// Who signs off on the business case.
    #[serde(default)]
    pub decision_makers: Vec<String>,
    /// Departments the change touches.
    #[serde(default)]
    pub affected_departments: Vec<String>,
    /// Free-form background.
    #[serde(default)]
    pub business_context: String,
    /// Customer-experience objective.
    #[serde(default)]
    pub cx_objective: String,
}

impl RequestParameters {
    /// Context variable names produced by [`Self::to_context`], in order.
    pub const VARIABLES: [&'static str; 12] = [
        "business_challenge",
        "current_state",
        "success_definition",
        "process_frequency",
        "monthly_volume",
        "people_involved",
        "manual_percentage",
        "business_scenario",
        "decision_makers",
        "affected_departments",
        "business_context",
        "cx_objective",
    ];

    /// Checks required fields and ranges.
    ///
    /// # Errors
    ///
    /// Returns `CaseflowError::InvalidRequest` naming the first bad field.
    pub fn validate(&self) -> Result<(), CaseflowError> {
        let required = [
            ("business_challenge", &self.business_challenge),
            ("current_state", &self.current_state),
            ("success_definition", &self.success_definition),
            ("process_frequency", &self.process_frequency),
            ("business_scenario", &self.business_scenario),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CaseflowError::InvalidRequest(format!(
                    "required field '{field}' is missing or empty"
                )));
            }
        }

        if self.manual_percentage > 100 {
            return Err(CaseflowError::InvalidRequest(format!(
                "manual_percentage must be between 0 and 100, got {}",
                self.manual_percentage
            )));
        }

        Ok(())
    }

    /// Free-text fields, for content screening.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("business_challenge", self.business_challenge.as_str()),
            ("current_state", self.current_state.as_str()),
            ("success_definition", self.success_definition.as_str()),
            ("business_scenario", self.business_scenario.as_str()),
            ("business_context", self.business_context.as_str()),
            ("cx_objective", self.cx_objective.as_str()),
        ]
    }

    /// Builds the initial execution context for a run.
    #[must_use]
    pub fn to_context(&self) -> ExecutionContext {
        let values = [
            self.business_challenge.clone(),
            self.current_state.clone(),
            self.success_definition.clone(),
            self.process_frequency.clone(),
            self.monthly_volume.to_string(),
            self.people_involved.to_string(),
            self.manual_percentage.to_string(),
            self.business_scenario.clone(),
            self.decision_makers.join(", "),
            self.affected_departments.join(", "),
            self.business_context.clone(),
            self.cx_objective.clone(),
        ];

        let mut ctx = ExecutionContext::new();
        for (key, value) in Self::VARIABLES.iter().zip(values) {
            // VARIABLES has no duplicates, so inserts into a fresh context succeed.
            let _ = ctx.insert(*key, value);
        }
        ctx
    }
}
