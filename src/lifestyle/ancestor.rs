use alloc::sync::Arc;

use super::{graph::shared_in, Lifestyle};
use crate::{
    any::Instance,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::{ConfigurationErrorKind, LocateError, LocateErrorKind},
    types::TypeRef,
};

/// One instance per nearest ancestor of the given type in the resolution chain.
#[derive(Debug, Clone)]
pub struct SingletonPerAncestor {
    ancestor: TypeRef,
}

impl SingletonPerAncestor {
    #[inline]
    #[must_use]
    pub const fn new(ancestor: TypeRef) -> Self {
        Self { ancestor }
    }

    #[inline]
    #[must_use]
    pub fn of<A: ?Sized + 'static>() -> Self {
        Self::new(TypeRef::of::<A>())
    }
}

impl Lifestyle for SingletonPerAncestor {
    #[inline]
    fn name(&self) -> &'static str {
        "SingletonPerAncestor"
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
        let types = context.requesting().types();
        let store = context
            .ancestors
            .iter()
            .find(|frame| types.is_assignable(&frame.activation_type, &self.ancestor))
            .map(|frame| frame.store.clone());

        let Some(store) = store else {
            return Err(context.error(LocateErrorKind::Configuration(ConfigurationErrorKind::AncestorMissing {
                ancestor: self.ancestor.clone(),
                activation_type: plan.activation_type().clone(),
            })));
        };
        shared_in(&store, plan, activate, context)
    }
}
