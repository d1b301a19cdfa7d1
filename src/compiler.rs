//! Turns a strategy into a reusable activation routine.
//!
//! A plan is built once per strategy and closed activation type by composing closures:
//! one per declared dependency, the selected constructor, injectors, enrichers and
//! disposal tracking. The lifestyle of the strategy wraps the composed routine.

mod build;
mod dependency;
mod plan;

pub(crate) use build::compile;
pub(crate) use dependency::DependencyFn;
pub use plan::{ActivationFn, CompiledPlan, PlanInfo};
