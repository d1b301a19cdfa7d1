use alloc::sync::Arc;

use super::Lifestyle;
use crate::{
    any::Instance,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::LocateError,
};

/// New instance on every activation, tracked by the scope the resolution runs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transient;

impl Lifestyle for Transient {
    #[inline]
    fn name(&self) -> &'static str {
        "Transient"
    }

    #[inline]
    fn fork(&self) -> Arc<dyn Lifestyle> {
        Arc::new(Self)
    }

    #[inline]
    fn is_transient(&self) -> bool {
        true
    }

    #[inline]
    fn activate(
        &self,
        _plan: &PlanInfo,
        activate: &ActivationFn,
        _owner: &Container,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError> {
        activate(context)
    }
}
