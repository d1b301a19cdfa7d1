use alloc::sync::Arc;
use core::fmt::{self, Debug, Formatter};

use super::Lifestyle;
use crate::{
    any::Instance,
    cache::CacheKey,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::{ConfigurationErrorKind, LocateError, LocateErrorKind},
    strategy::LocateKey,
};

type KeyFn = Arc<dyn Fn(&InjectionContext) -> Option<LocateKey> + Send + Sync>;

/// One instance per key computed from the injection context, stored in the owning scope.
#[derive(Clone)]
pub struct SingletonPerKey {
    key: KeyFn,
}

impl SingletonPerKey {
    #[inline]
    #[must_use]
    pub fn new(key: impl Fn(&InjectionContext) -> Option<LocateKey> + Send + Sync + 'static) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Uses the key passed to the locate call.
    #[inline]
    #[must_use]
    pub fn by_locate_key() -> Self {
        Self::new(|context| context.key().cloned())
    }
}

impl Lifestyle for SingletonPerKey {
    #[inline]
    fn name(&self) -> &'static str {
        "SingletonPerKey"
    }

    #[inline]
    fn fork(&self) -> Arc<dyn Lifestyle> {
        Arc::new(self.clone())
    }

    fn activate(
        &self,
        plan: &PlanInfo,
        activate: &ActivationFn,
        owner: &Container,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError> {
        let Some(key) = (self.key)(context) else {
            return Err(context.error(LocateErrorKind::Configuration(ConfigurationErrorKind::LifestyleKeyMissing {
                lifestyle: self.name(),
                activation_type: plan.activation_type().clone(),
            })));
        };
        owner.check_open(context)?;
        owner
            .cache()
            .get_or_materialize(CacheKey::new(plan.id(), Some(key)), || activate(&mut context.for_scope(owner)))
    }
}

impl Debug for SingletonPerKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonPerKey").finish_non_exhaustive()
    }
}
