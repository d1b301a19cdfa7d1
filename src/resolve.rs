//! The locate engine: candidate search through the scope chain, ranking, activation,
//! decoration and the fallback chain.

use alloc::{sync::Arc, vec::Vec};
use core::cmp::Reverse;
use tracing::debug;

use crate::{
    any::Instance,
    compiler::compile,
    condition::{conditions_met, ExportFilter},
    configure::RegistrationBlock,
    container::Container,
    context::{InjectionContext, InjectionSite},
    errors::{ConfigurationErrorKind, LocateError, LocateErrorKind},
    fallback::{self, LocateRequestInfo},
    immutable::SharedTree,
    strategy::{Caster, ExportKey, ExportStrategy, LocateKey, StorageKey, StrategyCollection},
    types::{generic, well_known::is_wrapper, TypeRef},
};

pub(crate) type StrategyTree = SharedTree<StorageKey, StrategyCollection>;

/// One locate, top-level or for a dependency.
pub(crate) struct LocateRequest<'a> {
    pub(crate) requested: &'a ExportKey,
    pub(crate) key: Option<&'a LocateKey>,
    pub(crate) site: Option<&'a InjectionSite>,
    pub(crate) filter: Option<&'a ExportFilter>,
}

impl LocateRequest<'_> {
    #[inline]
    fn info(&self) -> LocateRequestInfo<'_> {
        LocateRequestInfo {
            requested: self.requested,
            key: self.key,
            injected_into: self.site.map(InjectionSite::injected_type),
        }
    }
}

/// Located instance and the strategy that produced it, `None` for fallbacks.
pub(crate) struct Located {
    pub(crate) instance: Instance,
    pub(crate) strategy: Option<Arc<ExportStrategy>>,
}

/// Strategy eligible for a request, closed for the requested type.
struct Candidate {
    strategy: Arc<ExportStrategy>,
    closed: TypeRef,
    caster: Option<Caster>,
    specificity: usize,
}

#[derive(Clone, Copy)]
enum KeyMatch {
    /// Keyed strategies only match their own key, unkeyed requests only see unkeyed strategies.
    Exact,
    /// Without a key every strategy matches.
    AnyWithoutKey,
}

fn key_matches(strategy: &ExportStrategy, key: Option<&LocateKey>, policy: KeyMatch) -> bool {
    match (key, policy) {
        (Some(key), _) => strategy.key() == Some(key),
        (None, KeyMatch::Exact) => strategy.key().is_none(),
        (None, KeyMatch::AnyWithoutKey) => true,
    }
}

impl Container {
    /// Strategies of this scope's `tree` registered for `requested`, closing open generic ones.
    fn collect(&self, tree: &StrategyTree, requested: &ExportKey, mut accept: impl FnMut(&ExportStrategy, &TypeRef) -> bool) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if let Some(collection) = tree.get(&StorageKey::Export(requested.clone())) {
            let specificity = requested.as_type().map_or(0, TypeRef::specificity);
            for strategy in collection.iter() {
                if !accept(&**strategy, strategy.activation_type()) {
                    continue;
                }
                let caster = requested
                    .as_type()
                    .and_then(|ty| strategy.exports.iter().find(|export| export.export == *ty))
                    .and_then(|export| export.caster.clone());
                candidates.push(Candidate {
                    strategy: strategy.clone(),
                    closed: strategy.activation_type().clone(),
                    caster,
                    specificity,
                });
            }
        }

        let Some(closed_request) = requested.as_type().filter(|ty| !ty.is_open()) else {
            return candidates;
        };
        let Some(def) = closed_request.def() else {
            return candidates;
        };
        let Some(collection) = tree.get(&StorageKey::Open(def)) else {
            return candidates;
        };
        let types = self.types();
        for strategy in collection.iter() {
            let patterns = strategy.exports.iter().filter(|export| export.export.def() == Some(def));
            for export in patterns {
                let Some(matched) = generic::close(types, strategy.activation_type(), &export.export, closed_request, &strategy.constraints) else {
                    continue;
                };
                if accept(&**strategy, &matched.closed) {
                    candidates.push(Candidate {
                        strategy: strategy.clone(),
                        closed: matched.closed,
                        caster: export.caster.clone(),
                        specificity: matched.specificity,
                    });
                    break;
                }
            }
        }
        candidates
    }

    fn accepts(
        &self,
        strategy: &ExportStrategy,
        closed: &TypeRef,
        request: &LocateRequest<'_>,
        policy: KeyMatch,
        context: &InjectionContext,
    ) -> bool {
        strategy.environment().intersects(self.config().environment)
            && key_matches(strategy, request.key, policy)
            && request.filter.map_or(true, |filter| filter(strategy))
            && conditions_met(strategy, closed, request.site, context)
    }

    /// Best candidate first: priority, then conditional over unconditional, then the most closed
    /// generic (or least closed, see [`crate::ContainerConfig::prefer_open_generics`]), then the latest registration.
    fn rank(&self, candidates: &mut [Candidate]) {
        let prefer_open = self.config().prefer_open_generics;
        candidates.sort_by(|left, right| {
            let specificity = if prefer_open {
                left.specificity.cmp(&right.specificity)
            } else {
                right.specificity.cmp(&left.specificity)
            };
            right
                .strategy
                .priority()
                .cmp(&left.strategy.priority())
                .then_with(|| right.strategy.has_conditions().cmp(&left.strategy.has_conditions()))
                .then(specificity)
                .then_with(|| right.strategy.sequence.cmp(&left.strategy.sequence))
        });
    }

    fn cast(&self, candidate: &Candidate, requested: &ExportKey, instance: Instance, context: &InjectionContext) -> Result<Instance, LocateError> {
        let Some(caster) = &candidate.caster else {
            return Ok(instance);
        };
        caster(&instance).ok_or_else(|| {
            context.error(LocateErrorKind::Configuration(ConfigurationErrorKind::InvalidCast {
                export: requested.as_type().cloned().unwrap_or_else(|| candidate.closed.clone()),
                activation_type: candidate.closed.clone(),
            }))
        })
    }

    /// Activates `candidate`, registered in `owner`, compiling its plan on first use.
    fn activate(
        &self,
        owner: &Container,
        candidate: &Candidate,
        requested: &ExportKey,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError> {
        let strategy = &candidate.strategy;
        let plan = strategy.plan_for(&candidate.closed, || compile(strategy, &candidate.closed, owner, self))?;
        let instance = plan.execute(owner, context)?;
        self.cast(candidate, requested, instance, context)
    }

    /// Applies the decorators of the requested type, root scope first, in registration order.
    fn decorate(&self, request: &LocateRequest<'_>, instance: Instance, context: &InjectionContext) -> Result<Instance, LocateError> {
        if request.requested.as_type().is_none() {
            return Ok(instance);
        }

        let decorator_request = LocateRequest {
            requested: request.requested,
            key: None,
            site: request.site,
            filter: None,
        };
        let scopes = self.scopes().collect::<Vec<_>>();
        let mut decorators = Vec::new();
        for scope in scopes.into_iter().rev() {
            let mut found = scope.collect(&scope.inner.decorators, request.requested, |strategy, closed| {
                self.accepts(strategy, closed, &decorator_request, KeyMatch::AnyWithoutKey, context)
            });
            found.sort_by_key(|candidate| candidate.strategy.sequence);
            decorators.extend(found.into_iter().map(|candidate| (scope, candidate)));
        }

        let mut current = instance;
        for (owner, candidate) in decorators {
            let mut decorator_context = context.clone();
            decorator_context.decorated = Some(current);
            current = self.activate(owner, &candidate, request.requested, &mut decorator_context)?;
            debug!(decorator = %candidate.closed, "Decorator applied");
        }
        Ok(current)
    }

    /// Locates one instance, `Ok(None)` if nothing, not even a fallback, can produce it.
    pub(crate) fn resolve(&self, request: &LocateRequest<'_>, context: &mut InjectionContext) -> Result<Option<Located>, LocateError> {
        self.resolve_with(request, context, true)
    }

    fn resolve_with(
        &self,
        request: &LocateRequest<'_>,
        context: &mut InjectionContext,
        provide_missing: bool,
    ) -> Result<Option<Located>, LocateError> {
        for scope in self.scopes() {
            let mut candidates = scope.collect(&scope.inner.strategies, request.requested, |strategy, closed| {
                self.accepts(strategy, closed, request, KeyMatch::Exact, context)
            });
            if candidates.is_empty() {
                continue;
            }
            self.rank(&mut candidates);
            let candidate = candidates.swap_remove(0);
            debug!(
                activation_type = %candidate.closed,
                scope = scope.name(),
                alternatives = candidates.len(),
                "Strategy selected"
            );

            let instance = self.activate(scope, &candidate, request.requested, context)?;
            let instance = self.decorate(request, instance, context)?;
            return Ok(Some(Located {
                instance,
                strategy: Some(candidate.strategy),
            }));
        }

        if self.config().auto_register_wrappers {
            if let Some(located) = fallback::locate_wrapper(self, request, context)? {
                debug!("Located by wrapper fallback");
                return Ok(Some(located));
            }
        }

        let info = request.info();
        let locators = self.inner.shared.secondary.snapshot();
        for locator in locators.iter_from_end() {
            if let Some(instance) = locator.locate(&info, context) {
                debug!("Located by secondary locator");
                return Ok(Some(Located { instance, strategy: None }));
            }
        }

        if provide_missing {
            let providers = self.inner.shared.missing.snapshot();
            if providers.is_empty() {
                return Ok(None);
            }
            let mut block = RegistrationBlock::new();
            for provider in providers.iter_from_end() {
                provider.provide(&info, &mut block);
            }
            if !block.is_empty() {
                debug!(strategies = block.len(), "Missing export provided");
                self.root()
                    .commit(block)
                    .map_err(|kind| context.error(LocateErrorKind::Configuration(kind)))?;
                return self.resolve_with(request, context, false);
            }
        }
        Ok(None)
    }

    /// Locates every matching instance, child scopes first, by priority and then registration order.
    ///
    /// Without a key, keyed strategies are included.
    pub(crate) fn resolve_all(&self, request: &LocateRequest<'_>, context: &mut InjectionContext) -> Result<Vec<Located>, LocateError> {
        let mut located = Vec::new();
        for scope in self.scopes() {
            let mut candidates = scope.collect(&scope.inner.strategies, request.requested, |strategy, closed| {
                self.accepts(strategy, closed, request, KeyMatch::AnyWithoutKey, context)
            });
            candidates.sort_by_key(|candidate| (Reverse(candidate.strategy.priority()), candidate.strategy.sequence));

            for candidate in candidates {
                let instance = self.activate(scope, &candidate, request.requested, context)?;
                let instance = self.decorate(request, instance, context)?;
                located.push(Located {
                    instance,
                    strategy: Some(candidate.strategy),
                });
            }
        }
        debug!(count = located.len(), "Located all");
        Ok(located)
    }

    /// Returns `true` if some strategy in the scope chain, or a wrapper fallback, could produce `requested`.
    ///
    /// Conditions are not evaluated, they depend on the injection site.
    pub(crate) fn can_resolve(&self, requested: &ExportKey, key: Option<&LocateKey>) -> bool {
        let environment = self.config().environment;
        let visible = |strategy: &ExportStrategy, _: &TypeRef| {
            strategy.environment().intersects(environment) && key_matches(strategy, key, KeyMatch::Exact)
        };
        if self
            .scopes()
            .any(|scope| !scope.collect(&scope.inner.strategies, requested, visible).is_empty())
        {
            return true;
        }

        self.config().auto_register_wrappers
            && matches!(requested.as_type(), Some(TypeRef::Generic(def, _)) if is_wrapper(*def))
    }
}
