//! Goal-seeking search for the smallest on-track monthly contribution

use log::debug;
use serde::{Deserialize, Serialize};

use super::plan::{Projection, RetirementPlanState};
use super::projector::RetirementProjector;
use crate::config::EngineConfig;

/// Hard cap on bisection steps; the `high - low <= 1` condition normally stops far earlier
const MAX_SEARCH_ITERATIONS: u32 = 64;

/// Recommendation produced by [`ContributionOptimizer::optimize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub current_contribution: f64,

    pub recommended_contribution: f64,

    /// Recommended minus current contribution
    pub increase: f64,

    /// False when the plan was already on track and no search ran
    pub searched: bool,

    /// Whether the recommended contribution puts the plan on track
    pub reaches_target: bool,

    /// Bisection steps taken
    pub iterations: u32,

    /// Projection at the recommended contribution
    pub projection: Projection,
}

/// Binary search over monthly contributions
#[derive(Debug, Clone, Copy)]
pub struct ContributionOptimizer {
    projector: RetirementProjector,

    /// Search ceiling as a multiple of the current contribution
    search_multiplier: f64,
}

impl ContributionOptimizer {
    pub fn new(projector: RetirementProjector, search_multiplier: f64) -> Self {
        Self {
            projector,
            search_multiplier,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(RetirementProjector::from_config(config), config.search_multiplier)
    }

    /// Find the smallest contribution in `[current, current * multiplier]` that is on track,
    /// to within one currency unit, rounded up.
    ///
    /// Plans already on track are returned unchanged without searching. When no
    /// candidate in the range is on track the ceiling is recommended and
    /// `reaches_target` is false.
    pub fn optimize(&self, plan: &RetirementPlanState) -> OptimizationResult {
        let current = plan.monthly_contribution;
        let baseline = self.projector.project(plan);

        if baseline.is_on_track {
            return OptimizationResult {
                current_contribution: current,
                recommended_contribution: current,
                increase: 0.0,
                searched: false,
                reaches_target: true,
                iterations: 0,
                projection: baseline,
            };
        }

        let mut low = current;
        let mut high = current * self.search_multiplier;
        let mut best = high;
        let mut iterations = 0;

        while high - low > 1.0 && iterations < MAX_SEARCH_ITERATIONS {
            iterations += 1;
            let mid = (low + high) / 2.0;
            if self.projector.project(&plan.with_contribution(mid)).is_on_track {
                high = mid;
                best = mid;
            } else {
                low = mid;
            }
        }

        let recommended = best.ceil();
        let projection = self.projector.project(&plan.with_contribution(recommended));

        debug!(
            "Contribution search for user {}: {:.2} -> {:.2} in {} steps (on track: {})",
            plan.user_id, current, recommended, iterations, projection.is_on_track
        );

        OptimizationResult {
            current_contribution: current,
            recommended_contribution: recommended,
            increase: recommended - current,
            searched: true,
            reaches_target: projection.is_on_track,
            iterations,
            projection,
        }
    }
}

impl Default for ContributionOptimizer {
    fn default() -> Self {
        Self::new(RetirementProjector::default(), 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(contribution: f64) -> RetirementPlanState {
        RetirementPlanState {
            user_id: 9,
            current_age: 40,
            retirement_age: 67,
            current_savings: 20_000.0,
            monthly_contribution: contribution,
            expected_return: 6.0,
            inflation_rate: 2.0,
            current_income: 5_000.0,
        }
    }

    #[test]
    fn test_on_track_plan_is_unchanged() {
        let optimizer = ContributionOptimizer::default();
        let rich = plan(5_000.0);
        assert!(RetirementProjector::default().project(&rich).is_on_track);

        let result = optimizer.optimize(&rich);
        assert!(!result.searched);
        assert_eq!(result.recommended_contribution, 5_000.0);
        assert_eq!(result.increase, 0.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_finds_minimal_contribution() {
        let projector = RetirementProjector::default();
        let optimizer = ContributionOptimizer::default();
        let start = plan(1_000.0);
        assert!(!projector.project(&start).is_on_track);

        let result = optimizer.optimize(&start);
        assert!(result.searched);
        assert!(result.reaches_target);
        assert_eq!(result.recommended_contribution, result.recommended_contribution.ceil());
        assert!(result.recommended_contribution > 1_000.0);
        assert!(result.recommended_contribution <= 3_000.0);
        assert_eq!(result.increase, result.recommended_contribution - 1_000.0);

        // Within the search tolerance of the true threshold
        let just_below = start.with_contribution(result.recommended_contribution - 2.0);
        assert!(!projector.project(&just_below).is_on_track);
    }

    #[test]
    fn test_search_is_logarithmic() {
        let result = ContributionOptimizer::default().optimize(&plan(1_000.0));
        // Range of 2000 halves to <= 1 in at most 11 steps
        assert!(result.iterations <= 11, "took {} steps", result.iterations);
    }

    #[test]
    fn test_zero_contribution_has_empty_search_range() {
        let result = ContributionOptimizer::default().optimize(&plan(0.0));
        assert!(result.searched);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.recommended_contribution, 0.0);
        assert_eq!(result.increase, 0.0);
        assert!(!result.reaches_target);
        assert!(!result.projection.is_on_track);
    }

    #[test]
    fn test_unreachable_target_recommends_ceiling() {
        let mut hopeless = plan(100.0);
        hopeless.current_income = 50_000.0;
        let result = ContributionOptimizer::default().optimize(&hopeless);
        assert!(result.searched);
        assert!(!result.reaches_target);
        assert_eq!(result.recommended_contribution, 300.0);
    }
}
