//! Read-only view of what a scope chain has registered.

use alloc::{collections::BTreeSet, string::ToString as _, sync::Arc, vec::Vec};
use tracing::{debug, warn};

use crate::{
    compiler::compile,
    container::Container,
    errors::{ConfigurationErrorKind, LocateErrorKind},
    strategy::{ExportEnvironment, ExportKey, ExportStrategy, LocateKey, MemberKind},
    types::TypeRef,
};

/// Registered strategy as seen by [`Container::diagnostics`].
#[derive(Debug, Clone)]
pub struct StrategyInfo {
    pub id: u64,
    pub activation_type: TypeRef,
    pub exports: Vec<TypeRef>,
    pub names: Vec<Arc<str>>,
    pub key: Option<LocateKey>,
    pub priority: i32,
    pub lifestyle: &'static str,
    pub environment: ExportEnvironment,
    pub decorator: bool,
    /// A plan was compiled, the strategy can't be changed anymore.
    pub sealed: bool,
    /// Name of the scope the strategy is registered in.
    pub scope: Option<Arc<str>>,
}

impl StrategyInfo {
    fn new(strategy: &ExportStrategy, scope: &Container) -> Self {
        Self {
            id: strategy.id(),
            activation_type: strategy.activation_type().clone(),
            exports: strategy.exports().cloned().collect(),
            names: strategy.names.clone(),
            key: strategy.key().cloned(),
            priority: strategy.priority(),
            lifestyle: strategy.lifestyle_name(),
            environment: strategy.environment(),
            decorator: strategy.is_decorator(),
            sealed: strategy.is_sealed(),
            scope: scope.name().map(Arc::from),
        }
    }
}

/// Required dependency nothing visible from the scope is exported for.
///
/// Only a possible failure: the dependency may still be satisfied by extra data,
/// a secondary locator or a missing export provider at locate time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PossibleMissingDependency {
    pub activation_type: TypeRef,
    pub dependency: ExportKey,
    pub member: MemberKind,
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Strategies of the scope chain, nearest scope first, each scope in registration order.
    pub strategies: Vec<StrategyInfo>,
    pub missing: Vec<PossibleMissingDependency>,
}

impl Container {
    /// Every distinct strategy of the scope chain with the scope that owns it.
    fn registered(&self) -> Vec<(&Container, Arc<ExportStrategy>)> {
        let mut seen = BTreeSet::new();
        let mut registered = Vec::new();
        for scope in self.scopes() {
            let mut own = Vec::new();
            for tree in [&scope.inner.strategies, &scope.inner.decorators] {
                let snapshot = tree.snapshot();
                for collection in snapshot.values() {
                    own.extend(collection.iter().filter(|strategy| seen.insert(strategy.id())).cloned());
                }
            }
            own.sort_by_key(|strategy| strategy.sequence);
            registered.extend(own.into_iter().map(|strategy| (scope, strategy)));
        }
        registered
    }

    /// Lists the strategies visible from this scope and the required dependencies that
    /// no strategy is exported for.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let registered = self.registered();

        let mut missing = Vec::new();
        for (_, strategy) in &registered {
            for dependency in strategy.dependencies() {
                if !dependency.is_required() || !dependency.is_located() {
                    continue;
                }
                if self.can_resolve(dependency.requested(), dependency.key()) {
                    continue;
                }
                missing.push(PossibleMissingDependency {
                    activation_type: strategy.activation_type().clone(),
                    dependency: dependency.requested().clone(),
                    member: dependency.member(),
                });
            }
        }
        debug!(strategies = registered.len(), missing = missing.len(), "Diagnostics collected");

        Diagnostics {
            strategies: registered
                .iter()
                .map(|(scope, strategy)| StrategyInfo::new(strategy, scope))
                .collect(),
            missing,
        }
    }

    /// Compiles the plan of every closed strategy visible from this scope, instead of
    /// waiting for the first locate.
    ///
    /// Compiled strategies are sealed. Open generic strategies are only compiled per closing
    /// and are skipped, like decorators.
    ///
    /// # Errors
    /// Returns every configuration error found.
    pub fn validate(&self) -> Result<(), Vec<ConfigurationErrorKind>> {
        let mut errors = Vec::new();
        for (scope, strategy) in self.registered() {
            if strategy.is_open() || strategy.is_decorator() {
                continue;
            }
            let closed = strategy.activation_type();
            let compiled = strategy.plan_for(closed, || compile(&strategy, closed, scope, self));
            if let Err(err) = compiled {
                warn!(activation_type = %closed, "{}", err);
                errors.push(match err.kind {
                    LocateErrorKind::Configuration(kind) => kind,
                    kind => ConfigurationErrorKind::Invalid(kind.to_string()),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
