//! Feedback-driven report refinement.

use super::Report;
use crate::tools::{KeywordMatcher, KeywordRule, Matcher};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a piece of feedback asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementKind {
    /// Cost pressure.
    Budget,
    /// Schedule pressure.
    Timeline,
    /// Risk aversion.
    Risk,
}

impl RefinementKind {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "budget" => Some(Self::Budget),
            "timeline" => Some(Self::Timeline),
            "risk" => Some(Self::Risk),
            _ => None,
        }
    }
}

const BUDGET_RECOMMENDATION: &str =
    "Prioritize low-cost, high-impact automation opportunities for immediate ROI";
const RISK_RECOMMENDATION: &str =
    "Implement comprehensive risk mitigation with extensive pilot testing";

/// Applies free-text feedback to a finished report.
#[derive(Debug, Clone)]
pub struct Refiner {
    matcher: KeywordMatcher,
}

impl Default for Refiner {
    fn default() -> Self {
        Self {
            matcher: KeywordMatcher::new("refinement")
                .rule(KeywordRule::new("budget", ["budget"]))
                .rule(KeywordRule::new("timeline", ["timeline", "faster"]))
                .rule(KeywordRule::new("risk", ["risk"])),
        }
    }
}

impl Refiner {
    /// Creates a refiner with a custom matcher. Rule labels must be
    /// `budget`, `timeline` or `risk`; other labels are ignored.
    #[must_use]
    pub fn with_matcher(matcher: KeywordMatcher) -> Self {
        Self { matcher }
    }

    /// Classifies feedback. The first matching rule wins.
    #[must_use]
    pub fn classify(&self, feedback: &str) -> Option<RefinementKind> {
        self.matcher
            .find(feedback)
            .and_then(|candidate| RefinementKind::from_label(&candidate.key))
    }

    /// Returns a refined copy of `report`.
    ///
    /// Budget and risk feedback put a recommendation first; timeline
    /// feedback compresses the first two roadmap phases. Non-blank feedback
    /// is always recorded.
    #[must_use]
    pub fn refine(&self, report: &Report, feedback: &str) -> Report {
        let mut refined = report.clone();
        let kind = self.classify(feedback);
        debug!(kind = ?kind, "Refining report");

        match kind {
            Some(RefinementKind::Budget) => {
                refined
                    .recommendations
                    .insert(0, BUDGET_RECOMMENDATION.to_string());
            }
            Some(RefinementKind::Timeline) => {
                for phase in &mut refined.roadmap {
                    match phase.phase.as_str() {
                        "phase_1" => phase.title = "Accelerated Foundation (Month 1)".to_string(),
                        "phase_2" => phase.title = "Rapid Development (Months 2-3)".to_string(),
                        _ => {}
                    }
                }
            }
            Some(RefinementKind::Risk) => {
                refined
                    .recommendations
                    .insert(0, RISK_RECOMMENDATION.to_string());
            }
            None => {}
        }

        let feedback = feedback.trim();
        if !feedback.is_empty() {
            refined.refinements.push(feedback.to_string());
        }
        refined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::sample_request;
    use crate::report::ResultFormatter;

    fn report() -> Report {
        ResultFormatter::default().fallback(&sample_request()).unwrap()
    }

    #[test]
    fn test_classify() {
        let refiner = Refiner::default();
        assert_eq!(refiner.classify("We have a tight BUDGET"), Some(RefinementKind::Budget));
        assert_eq!(refiner.classify("Can this go faster?"), Some(RefinementKind::Timeline));
        assert_eq!(refiner.classify("Too much risk"), Some(RefinementKind::Risk));
        assert_eq!(refiner.classify("budget and risk"), Some(RefinementKind::Budget));
        assert_eq!(refiner.classify("Looks great"), None);
    }

    #[test]
    fn test_budget_feedback_prepends_recommendation() {
        let original = report();
        let refined = Refiner::default().refine(&original, "Budget is limited");

        assert_eq!(refined.recommendations.len(), original.recommendations.len() + 1);
        assert_eq!(refined.recommendations[0], BUDGET_RECOMMENDATION);
        assert_eq!(refined.refinements, vec!["Budget is limited".to_string()]);
        assert!(original.refinements.is_empty());
    }

    #[test]
    fn test_timeline_feedback_renames_phases() {
        let refined = Refiner::default().refine(&report(), "we need a shorter timeline");

        assert_eq!(refined.phase("phase_1").unwrap().title, "Accelerated Foundation (Month 1)");
        assert_eq!(refined.phase("phase_2").unwrap().title, "Rapid Development (Months 2-3)");
        assert_eq!(
            refined.phase("phase_3").unwrap().title,
            "Deployment & Optimization (Months 6-8)"
        );
    }

    #[test]
    fn test_risk_feedback() {
        let refined = Refiner::default().refine(&report(), "minimise risk");
        assert_eq!(refined.recommendations[0], RISK_RECOMMENDATION);
    }

    #[test]
    fn test_unclassified_feedback_only_recorded() {
        let original = report();
        let refined = Refiner::default().refine(&original, "  add a slide on hiring ");

        assert_eq!(refined.recommendations, original.recommendations);
        assert_eq!(refined.refinements, vec!["add a slide on hiring".to_string()]);

        let untouched = Refiner::default().refine(&original, "   ");
        assert_eq!(untouched, original);
    }

    #[test]
    fn test_refinements_accumulate() {
        let refiner = Refiner::default();
        let once = refiner.refine(&report(), "budget");
        let twice = refiner.refine(&once, "risk");

        assert_eq!(twice.recommendations[0], RISK_RECOMMENDATION);
        assert_eq!(twice.recommendations[1], BUDGET_RECOMMENDATION);
        assert_eq!(twice.refinements.len(), 2);
    }
}
