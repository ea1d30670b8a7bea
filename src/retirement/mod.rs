//! Retirement projection and contribution optimization

mod plan;
mod projector;
mod optimizer;

pub use plan::{Projection, RetirementPlanState, MAX_PLAN_AGE};
pub use projector::{RetirementProjector, future_value, future_value_annuity};
pub use optimizer::{ContributionOptimizer, OptimizationResult};
