use alloc::sync::Arc;
use parking_lot::{Mutex, ReentrantMutex};
use tracing::debug;

use super::Lifestyle;
use crate::{
    any::{Instance, WeakInstance},
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::LocateError,
};

/// Shared instance held only weakly: once every user dropped it, the next request builds a new one.
///
/// Instances aren't tracked for disposal.
pub struct WeakSingleton {
    slot: Mutex<Option<WeakInstance>>,
    lock: ReentrantMutex<()>,
}

impl Default for WeakSingleton {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl WeakSingleton {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            lock: ReentrantMutex::new(()),
        }
    }

    #[inline]
    fn upgrade(&self) -> Option<Instance> {
        self.slot.lock().as_ref().and_then(WeakInstance::upgrade)
    }
}

impl Lifestyle for WeakSingleton {
    #[inline]
    fn name(&self) -> &'static str {
        "WeakSingleton"
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
        if let Some(instance) = self.upgrade() {
            return Ok(instance);
        }

        let _guard = self.lock.lock();
        if let Some(instance) = self.upgrade() {
            return Ok(instance);
        }

        let instance = activate(&mut context.for_scope(owner).untracked())?;
        *self.slot.lock() = Some(instance.downgrade());
        debug!(activation_type = %plan.activation_type(), "Weak singleton materialized");

        Ok(instance)
    }
}
