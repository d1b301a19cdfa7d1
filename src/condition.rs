//! Predicates deciding whether a strategy is eligible for one injection site.

use alloc::{sync::Arc, vec::Vec};
use core::fmt::{self, Debug, Formatter};
use tracing::debug;

use crate::{
    context::{InjectionContext, InjectionSite},
    strategy::{ExportStrategy, MetadataValue},
    types::{TypeRef, TypeRegistry},
};

/// Everything a condition may look at.
pub struct ConditionContext<'a> {
    pub(crate) strategy: &'a ExportStrategy,
    pub(crate) activation_type: &'a TypeRef,
    pub(crate) site: Option<&'a InjectionSite>,
    pub(crate) context: &'a InjectionContext,
}

impl<'a> ConditionContext<'a> {
    #[inline]
    #[must_use]
    pub const fn strategy(&self) -> &'a ExportStrategy {
        self.strategy
    }

    /// Closed type the strategy would activate.
    #[inline]
    #[must_use]
    pub const fn activation_type(&self) -> &'a TypeRef {
        self.activation_type
    }

    /// `None` for top-level locate calls.
    #[inline]
    #[must_use]
    pub const fn site(&self) -> Option<&'a InjectionSite> {
        self.site
    }

    #[inline]
    #[must_use]
    pub fn injected_into(&self) -> Option<&'a TypeRef> {
        self.site.map(InjectionSite::injected_type)
    }

    /// Only meaningful for request-time conditions, the result of other conditions is cached per site.
    #[inline]
    #[must_use]
    pub const fn injection_context(&self) -> &'a InjectionContext {
        self.context
    }

    #[inline]
    #[must_use]
    pub fn types(&self) -> &'a TypeRegistry {
        self.context.requesting.types()
    }
}

pub trait Condition: Send + Sync {
    fn meets(&self, cx: &ConditionContext<'_>) -> bool;

    /// Request-time conditions are evaluated on every resolution instead of once per site.
    #[inline]
    fn is_request_time(&self) -> bool {
        false
    }
}

/// Met when the dependency is injected into one of the types (or a type assignable to them).
#[derive(Debug, Clone)]
pub struct WhenInjectedInto(pub Vec<TypeRef>);

impl Condition for WhenInjectedInto {
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        let Some(injected_into) = cx.injected_into() else {
            return false;
        };
        self.0.iter().any(|target| cx.types().is_assignable(injected_into, target))
    }
}

/// Met when the type being injected into carries the attribute.
#[derive(Debug, Clone)]
pub struct WhenClassHas(pub Arc<str>);

impl Condition for WhenClassHas {
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        cx.site().is_some_and(|site| site.class_attributes().has(&self.0))
    }
}

/// Met when the parameter or member carries the attribute.
#[derive(Debug, Clone)]
pub struct WhenMemberHas(pub Arc<str>);

impl Condition for WhenMemberHas {
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        cx.site().is_some_and(|site| site.member_attributes().has(&self.0))
    }
}

/// Met when the requested type carries the attribute.
#[derive(Debug, Clone)]
pub struct WhenTargetHas(pub Arc<str>);

impl Condition for WhenTargetHas {
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        cx.site().is_some_and(|site| site.target_attributes().has(&self.0))
    }
}

#[derive(Debug, Clone)]
pub struct WhenMemberNamed(pub Arc<str>);

impl Condition for WhenMemberNamed {
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        cx.site().and_then(InjectionSite::member_name) == Some(&*self.0)
    }
}

/// Static condition from a closure.
#[derive(Clone)]
pub struct FnCondition<F>(pub F);

impl<F> Condition for FnCondition<F>
where
    F: Fn(&ConditionContext<'_>) -> bool + Send + Sync,
{
    #[inline]
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        (self.0)(cx)
    }
}

/// Condition from a closure evaluated on every resolution.
#[derive(Clone)]
pub struct RequestTimeCondition<F>(pub F);

impl<F> Condition for RequestTimeCondition<F>
where
    F: Fn(&ConditionContext<'_>) -> bool + Send + Sync,
{
    #[inline]
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        (self.0)(cx)
    }

    #[inline]
    fn is_request_time(&self) -> bool {
        true
    }
}

/// Negation of another condition.
#[derive(Clone)]
pub struct Unless(pub Arc<dyn Condition>);

impl Condition for Unless {
    #[inline]
    fn meets(&self, cx: &ConditionContext<'_>) -> bool {
        !self.0.meets(cx)
    }

    #[inline]
    fn is_request_time(&self) -> bool {
        self.0.is_request_time()
    }
}

impl Debug for Unless {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unless").finish_non_exhaustive()
    }
}

/// Caller supplied predicate over candidate strategies of one locate call.
pub type ExportFilter = Arc<dyn Fn(&ExportStrategy) -> bool + Send + Sync>;

/// Filter accepting strategies whose metadata has `key` set to `value`.
#[must_use]
pub fn metadata_filter(key: impl Into<Arc<str>>, value: impl Into<MetadataValue>) -> ExportFilter {
    let key = key.into();
    let value = value.into();
    Arc::new(move |strategy: &ExportStrategy| strategy.metadata().matches(&key, &value))
}

/// Evaluates the conditions of `strategy`, caching static results on the site.
pub(crate) fn conditions_met(
    strategy: &ExportStrategy,
    activation_type: &TypeRef,
    site: Option<&InjectionSite>,
    context: &InjectionContext,
) -> bool {
    let conditions = strategy.conditions();
    if conditions.is_empty() {
        return true;
    }

    let cx = ConditionContext {
        strategy,
        activation_type,
        site,
        context,
    };
    let request_time_met = conditions
        .iter()
        .filter(|condition| condition.is_request_time())
        .all(|condition| condition.meets(&cx));
    if !request_time_met {
        return false;
    }

    let evaluate_static = || {
        conditions
            .iter()
            .filter(|condition| !condition.is_request_time())
            .all(|condition| condition.meets(&cx))
    };
    let Some(site) = site else {
        return evaluate_static();
    };

    let cache_key = (strategy.id(), activation_type.clone());
    if let Some(met) = site.conditions.get(&cache_key) {
        return met;
    }
    let met = evaluate_static();
    site.conditions.thread_safe_update(cache_key, met);
    debug!(activation_type = %activation_type, met, "Condition result cached");
    met
}
