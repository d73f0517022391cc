//! Savings, cost and ROI projections.

use crate::context::RequestParameters;
use crate::errors::InvalidProjection;
use crate::utils::round2;
use serde::{Deserialize, Serialize};

/// A savings-rate step: applies when the manual percentage is strictly
/// greater than `above`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateThreshold {
    /// Exclusive lower bound on the manual percentage.
    pub above: u8,
    /// Savings per transaction.
    pub rate: f64,
}

/// Per-transaction savings rates keyed by manual percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// Threshold steps. The highest threshold below the input wins.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<RateThreshold>,
    /// Rate when no threshold applies.
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
}

fn default_thresholds() -> Vec<RateThreshold> {
    vec![
        RateThreshold { above: 80, rate: 50.0 },
        RateThreshold { above: 60, rate: 35.0 },
    ]
}

fn default_base_rate() -> f64 {
    25.0
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            base_rate: default_base_rate(),
        }
    }
}

impl RateTable {
    /// Returns the rate for a manual percentage.
    #[must_use]
    pub fn rate(&self, manual_percentage: u8) -> f64 {
        self.thresholds
            .iter()
            .filter(|t| manual_percentage > t.above)
            .max_by_key(|t| t.above)
            .map_or(self.base_rate, |t| t.rate)
    }
}

/// Implementation cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Fixed project cost.
    #[serde(default = "default_base_cost")]
    pub base_cost: f64,
    /// Cost per monthly transaction.
    #[serde(default = "default_per_volume")]
    pub per_volume: f64,
    /// Cap on the volume component.
    #[serde(default = "default_volume_cap")]
    pub volume_cap: f64,
    /// Cost per person involved.
    #[serde(default = "default_per_person")]
    pub per_person: f64,
    /// Lower clamp on the total.
    #[serde(default)]
    pub min_cost: f64,
    /// Upper clamp on the total.
    #[serde(default = "default_max_cost")]
    pub max_cost: f64,
}

fn default_base_cost() -> f64 {
    75_000.0
}

fn default_per_volume() -> f64 {
    100.0
}

fn default_volume_cap() -> f64 {
    150_000.0
}

fn default_per_person() -> f64 {
    10_000.0
}

fn default_max_cost() -> f64 {
    500_000.0
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base_cost: default_base_cost(),
            per_volume: default_per_volume(),
            volume_cap: default_volume_cap(),
            per_person: default_per_person(),
            min_cost: 0.0,
            max_cost: default_max_cost(),
        }
    }
}

impl CostModel {
    /// Computes the clamped implementation cost.
    #[must_use]
    pub fn cost(&self, monthly_volume: u64, people_involved: u32) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let volume = monthly_volume as f64;
        let total = self.base_cost
            + (volume * self.per_volume).min(self.volume_cap)
            + f64::from(people_involved) * self.per_person;
        total.max(self.min_cost).min(self.max_cost)
    }
}

/// Tunables for the projection arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectionConfig {
    /// Savings rates.
    #[serde(default)]
    pub rates: RateTable,
    /// Implementation cost model.
    #[serde(default)]
    pub cost: CostModel,
    /// Savings multiplier per person: `1 + people * per_person_factor`.
    #[serde(default)]
    pub per_person_factor: f64,
}

/// Financial projections for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Savings per month.
    pub monthly_savings: f64,
    /// Savings per year.
    pub annual_savings: f64,
    /// One-off implementation cost.
    pub implementation_cost: f64,
    /// Annual savings over cost, as a percentage (2 decimals).
    pub roi_percentage: f64,
    /// Months to recover the cost (2 decimals).
    pub payback_months: f64,
}

impl Projection {
    /// Computes the projection for a request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProjection` when monthly savings are not positive,
    /// the cost is not positive, or any value is not finite.
    pub fn compute(
        config: &ProjectionConfig,
        request: &RequestParameters,
    ) -> Result<Self, InvalidProjection> {
        #[allow(clippy::cast_precision_loss)]
        let volume = request.monthly_volume as f64;
        let people_multiplier = 1.0 + f64::from(request.people_involved) * config.per_person_factor;
        let monthly_savings =
            volume * config.rates.rate(request.manual_percentage) * people_multiplier;

        if !monthly_savings.is_finite() {
            return Err(InvalidProjection::new("monthly savings is not finite"));
        }
        if monthly_savings <= 0.0 {
            return Err(InvalidProjection::new(format!(
                "monthly savings must be positive, got {monthly_savings}"
            )));
        }

        let implementation_cost = config
            .cost
            .cost(request.monthly_volume, request.people_involved);
        if !implementation_cost.is_finite() || implementation_cost <= 0.0 {
            return Err(InvalidProjection::new(format!(
                "implementation cost must be positive, got {implementation_cost}"
            )));
        }

        let annual_savings = monthly_savings * 12.0;
        let projection = Self {
            monthly_savings,
            annual_savings,
            implementation_cost,
            roi_percentage: round2(annual_savings / implementation_cost * 100.0),
            payback_months: round2(implementation_cost / monthly_savings),
        };

        if [
            projection.annual_savings,
            projection.roi_percentage,
            projection.payback_months,
        ]
        .iter()
        .any(|v| !v.is_finite())
        {
            return Err(InvalidProjection::new("projection contains a non-finite value"));
        }
        Ok(projection)
    }
}

/// Automation complexity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    /// Score below 3.
    WorkflowAutomation,
    /// Score 3 to 5.
    ProcessAutomation,
    /// Score 6 and above.
    EnterpriseAutomation,
}

impl ComplexityLevel {
    /// Scores volume, headcount and manual effort into a tier.
    #[must_use]
    pub fn assess(request: &RequestParameters) -> Self {
        let volume = match request.monthly_volume {
            v if v > 1000 => 3,
            v if v > 500 => 2,
            v if v > 100 => 1,
            _ => 0,
        };
        let people = match request.people_involved {
            p if p > 10 => 3,
            p if p > 5 => 2,
            p if p > 2 => 1,
            _ => 0,
        };
        let manual = match request.manual_percentage {
            m if m > 80 => 2,
            m if m > 60 => 1,
            _ => 0,
        };

        match volume + people + manual {
            s if s >= 6 => Self::EnterpriseAutomation,
            s if s >= 3 => Self::ProcessAutomation,
            _ => Self::WorkflowAutomation,
        }
    }

    /// Returns the snake-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowAutomation => "workflow_automation",
            Self::ProcessAutomation => "process_automation",
            Self::EnterpriseAutomation => "enterprise_automation",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
