use alloc::sync::Arc;
use core::fmt::{self, Debug, Formatter};

use crate::{
    any::Instance,
    container::Container,
    context::InjectionContext,
    errors::LocateError,
    lifestyle::Lifestyle,
    types::TypeRef,
};

/// Composed construction routine of one plan, without the lifestyle.
pub type ActivationFn = dyn Fn(&mut InjectionContext) -> Result<Instance, LocateError> + Send + Sync;

/// Identity of a compiled plan, the cache key of every lifestyle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanInfo {
    pub(crate) id: u64,
    pub(crate) activation_type: TypeRef,
    pub(crate) strategy_id: u64,
}

impl PlanInfo {
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Closed type the plan activates.
    #[inline]
    #[must_use]
    pub const fn activation_type(&self) -> &TypeRef {
        &self.activation_type
    }

    #[inline]
    #[must_use]
    pub const fn strategy_id(&self) -> u64 {
        self.strategy_id
    }
}

/// Memoized activation of one strategy for one closed type.
pub struct CompiledPlan {
    pub(crate) info: PlanInfo,
    pub(crate) lifestyle: Option<Arc<dyn Lifestyle>>,
    pub(crate) activate: Arc<ActivationFn>,
}

impl CompiledPlan {
    /// Produces an instance through the lifestyle, or activates directly for transient plans.
    ///
    /// `owner` is the scope the strategy is registered in.
    ///
    /// # Errors
    /// Returns the activation or lifestyle error.
    #[inline]
    pub fn execute(&self, owner: &Container, context: &mut InjectionContext) -> Result<Instance, LocateError> {
        match &self.lifestyle {
            Some(lifestyle) => lifestyle.activate(&self.info, &*self.activate, owner, context),
            None => (self.activate)(context),
        }
    }

    #[inline]
    #[must_use]
    pub const fn info(&self) -> &PlanInfo {
        &self.info
    }
}

impl Debug for CompiledPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlan")
            .field("info", &self.info)
            .field("lifestyle", &self.lifestyle.as_ref().map(|lifestyle| lifestyle.name()))
            .finish_non_exhaustive()
    }
}
