use alloc::sync::Arc;
use tracing::debug;

use super::Lifestyle;
use crate::{
    any::Instance,
    cache::CacheKey,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::{ConfigurationErrorKind, LocateError, LocateErrorKind},
};

fn materialize_in(
    scope: &Container,
    plan: &PlanInfo,
    activate: &ActivationFn,
    context: &InjectionContext,
) -> Result<Instance, LocateError> {
    scope.check_open(context)?;
    scope.cache().get_or_materialize(CacheKey::new(plan.id(), None), || {
        debug!(activation_type = %plan.activation_type(), scope = scope.name(), "Scoped instance materialized");
        activate(&mut context.for_scope(scope))
    })
}

/// One instance per scope the locate call starts from, disposed with that scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingletonPerScope;

impl Lifestyle for SingletonPerScope {
    #[inline]
    fn name(&self) -> &'static str {
        "SingletonPerScope"
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
        let scope = context.requesting().clone();
        materialize_in(&scope, plan, activate, context)
    }
}

/// One instance per nearest scope with the given name.
#[derive(Debug, Clone)]
pub struct SingletonPerNamedScope {
    scope_name: Arc<str>,
}

impl SingletonPerNamedScope {
    #[inline]
    #[must_use]
    pub fn new(scope_name: impl Into<Arc<str>>) -> Self {
        Self {
            scope_name: scope_name.into(),
        }
    }
}

impl Lifestyle for SingletonPerNamedScope {
    #[inline]
    fn name(&self) -> &'static str {
        "SingletonPerNamedScope"
    }

    #[inline]
    fn fork(&self) -> Arc<dyn Lifestyle> {
        Arc::new(self.clone())
    }

    fn activate(
        &self,
        plan: &PlanInfo,
        activate: &ActivationFn,
        _owner: &Container,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError> {
        let Some(scope) = context.requesting().find_scope(&self.scope_name) else {
            return Err(context.error(LocateErrorKind::Configuration(ConfigurationErrorKind::NamedScopeMissing {
                name: self.scope_name.clone(),
            })));
        };
        materialize_in(&scope, plan, activate, context)
    }
}
