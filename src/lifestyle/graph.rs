use alloc::sync::Arc;

use super::Lifestyle;
use crate::{
    any::Instance,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::{InjectionContext, ObjectGraph},
    errors::LocateError,
};

/// Shares `store` between activations of `plan`, keeping the first stored instance.
///
/// The store belongs to one resolution, so no lock is held while activating.
pub(super) fn shared_in(
    store: &ObjectGraph,
    plan: &PlanInfo,
    activate: &ActivationFn,
    context: &mut InjectionContext,
) -> Result<Instance, LocateError> {
    if let Some(instance) = store.lock().get(&plan.id()) {
        return Ok(instance.clone());
    }
    let instance = activate(context)?;
    Ok(store.lock().entry(plan.id()).or_insert(instance).clone())
}

/// One instance per top-level locate call, shared by every branch of its object graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingletonPerObjectGraph;

impl Lifestyle for SingletonPerObjectGraph {
    #[inline]
    fn name(&self) -> &'static str {
        "SingletonPerObjectGraph"
    }

    #[inline]
    fn fork(&self) -> Arc<dyn Lifestyle> {
        Arc::new(Self)
    }

    fn activate(
        &self,
        plan: &PlanInfo,
        activate: &ActivationFn,
        _owner: &Container,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError> {
        let store = context.graph.clone();
        shared_in(&store, plan, activate, context)
    }
}
