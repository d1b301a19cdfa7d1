use alloc::sync::Arc;
use arc_swap::ArcSwapOption;
use parking_lot::ReentrantMutex;
use tracing::debug;

use super::Lifestyle;
use crate::{
    any::Instance,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::LocateError,
};

/// One instance per compiled plan, owned and disposed by the scope the strategy is registered in.
///
/// Dependencies of the instance are resolved from the owning scope too.
pub struct Singleton {
    value: ArcSwapOption<Instance>,
    lock: ReentrantMutex<()>,
}

impl Default for Singleton {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Singleton {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: ArcSwapOption::empty(),
            lock: ReentrantMutex::new(()),
        }
    }

    #[inline]
    fn load(&self) -> Option<Instance> {
        self.value.load_full().map(|instance| (*instance).clone())
    }
}

impl Lifestyle for Singleton {
    #[inline]
    fn name(&self) -> &'static str {
        "Singleton"
    }

    #[inline]
    fn fork(&self) -> Arc<dyn Lifestyle> {
        Arc::new(Self::new())
    }

    fn activate(
        &self,
        plan: &PlanInfo,
        activate: &ActivationFn,
        owner: &Container,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError> {
        // The value outlives the owner's cache, so a closed owner must not hand it out.
        owner.check_open(context)?;
        if let Some(instance) = self.load() {
            return Ok(instance);
        }

        let _guard = self.lock.lock();
        if let Some(instance) = self.load() {
            return Ok(instance);
        }

        let instance = activate(&mut context.for_scope(owner))?;
        self.value.store(Some(Arc::new(instance.clone())));
        debug!(activation_type = %plan.activation_type(), "Singleton materialized");

        Ok(instance)
    }
}
