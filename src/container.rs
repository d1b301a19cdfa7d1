use alloc::{
    boxed::Box,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::{
    fmt::{self, Debug, Formatter},
    iter,
    ops::Deref,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use tracing::{debug, error, info_span};

use crate::{
    any::Instance,
    cache::ScopeCache,
    condition::ExportFilter,
    config::ContainerConfig,
    configure::RegistrationBlock,
    context::{DisposalTarget, ExtraData, InjectionContext},
    disposal::{DisposalScope, DisposalScopeProvider},
    errors::{ConfigurationErrorKind, DisposalErrorKind, LocateError, LocateErrorKind, TrailEntry},
    fallback::{DeferredLocate, Factory, Lazy, Meta, MissingExportStrategyProvider, SecondaryLocator},
    immutable::{SharedList, SharedTree},
    inject::downcast_instance,
    resolve::{LocateRequest, Located, StrategyTree},
    strategy::{ExportKey, ExportStrategy, LocateKey, StorageKey, StrategyCollection},
    types::{TypeRef, TypeRegistry},
    utils::unique_id,
};

/// State shared by a root container and every scope created from it.
pub(crate) struct Shared {
    pub(crate) config: ContainerConfig,
    pub(crate) types: TypeRegistry,
    pub(crate) secondary: SharedList<Arc<dyn SecondaryLocator>>,
    pub(crate) missing: SharedList<Arc<dyn MissingExportStrategyProvider>>,
    /// Bumped by every registration change anywhere in the tree.
    pub(crate) generation: AtomicU64,
}

/// Options of one locate call.
#[derive(Clone, Default)]
pub struct LocateOptions {
    pub(crate) extra: ExtraData,
    pub(crate) filter: Option<ExportFilter>,
    pub(crate) key: Option<LocateKey>,
}

impl LocateOptions {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_extra(mut self, extra: ExtraData) -> Self {
        self.extra = extra;
        self
    }

    /// Only strategies passing `filter` are considered, see [`crate::metadata_filter`].
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: ExportFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_key(mut self, key: impl Into<LocateKey>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl Debug for LocateOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocateOptions")
            .field("extra", &self.extra)
            .field("filter", &self.filter.is_some())
            .field("key", &self.key)
            .finish()
    }
}

/// Root container or child scope.
///
/// Cloning is cheap and every clone refers to the same scope. The scope is closed,
/// disposing everything it tracked, when [`Container::close`] is called or its last handle
/// (including the handles held by child scopes) is dropped.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates an empty root container with the default config.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ContainerConfig) -> Self {
        let shared = Arc::new(Shared {
            config,
            types: TypeRegistry::new(),
            secondary: SharedList::new(),
            missing: SharedList::new(),
            generation: AtomicU64::new(0),
        });
        Self {
            inner: Arc::new(ContainerInner::new(None, None, shared, ExtraData::new(), Some(Arc::new(DisposalScope::new())))),
        }
    }

    /// Registers the strategies built by `configure` in this scope.
    ///
    /// Nothing is registered if any of them is invalid.
    ///
    /// # Errors
    /// Returns the first invalid registration, see [`ConfigurationErrorKind`].
    pub fn configure(&self, configure: impl FnOnce(&mut RegistrationBlock)) -> Result<(), ConfigurationErrorKind> {
        let mut block = RegistrationBlock::new();
        configure(&mut block);
        self.commit(block)
    }

    /// Creates child scope builder
    #[inline]
    #[must_use]
    pub fn enter(self) -> ChildContainerBuilder {
        ChildContainerBuilder {
            container: self,
            name: None,
            registrations: None,
            extra: ExtraData::new(),
            disposal: ChildDisposal::Owned,
        }
    }

    /// Child scope closed when the returned guard is dropped.
    #[inline]
    #[must_use]
    pub fn begin_lifetime_scope(&self) -> LifetimeScope {
        LifetimeScope {
            container: self.child(None, ExtraData::new(), Some(Arc::new(DisposalScope::new()))),
        }
    }

    /// Named child scope closed when the returned guard is dropped, see [`crate::SingletonPerNamedScope`].
    #[inline]
    #[must_use]
    pub fn begin_named_lifetime_scope(&self, name: impl Into<Arc<str>>) -> LifetimeScope {
        LifetimeScope {
            container: self.child(Some(name.into()), ExtraData::new(), Some(Arc::new(DisposalScope::new()))),
        }
    }

    /// Locates an instance of `requested`.
    ///
    /// Extra data of the scope chain and of `options` is checked first, then the strategies
    /// of this scope and its ancestors, then the fallbacks.
    ///
    /// # Errors
    /// - Returns [`LocateErrorKind::CannotLocateExport`] if nothing can produce the export
    /// - Returns the failure of the activation otherwise, with the trail of what was being resolved
    pub fn locate_instance(&self, requested: &ExportKey, options: LocateOptions) -> Result<Instance, LocateError> {
        let span = info_span!("locate", export = %requested, scope = self.name());
        let _guard = span.enter();

        match self.locate_located(requested, options) {
            Ok(Some(Located { instance, .. })) => Ok(instance),
            Ok(None) => {
                let err = self
                    .error(LocateErrorKind::CannotLocateExport {
                        requested: requested.clone(),
                    })
                    .with_entry(TrailEntry {
                        requested: requested.clone(),
                        target: None,
                        depth: 0,
                    });
                error!("{}", err);
                Err(err)
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn locate_located(&self, requested: &ExportKey, options: LocateOptions) -> Result<Option<Located>, LocateError> {
        self.ensure_open()?;
        let extra = self.scope_extra().merged(&options.extra);
        let from_extra = match requested {
            ExportKey::Type(ty) => extra.by_type(ty),
            ExportKey::Name(name) => extra.by_name(name),
        };
        if let Some(instance) = from_extra {
            debug!("Found in extra data");
            return Ok(Some(Located {
                instance: instance.clone(),
                strategy: None,
            }));
        }

        let mut context = InjectionContext::new(self, extra, options.key.clone());
        let request = LocateRequest {
            requested,
            key: options.key.as_ref(),
            site: None,
            filter: options.filter.as_ref(),
        };
        self.resolve(&request, &mut context)
    }

    /// Gets an instance of `K` from the container
    ///
    /// # Errors
    /// See [`Self::locate_instance`]
    #[inline]
    pub fn locate<K: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<K>, LocateError> {
        self.locate_with(LocateOptions::new())
    }

    /// # Errors
    /// See [`Self::locate_instance`]
    pub fn locate_with<K: ?Sized + Send + Sync + 'static>(&self, options: LocateOptions) -> Result<Arc<K>, LocateError> {
        let instance = self.locate_instance(&ExportKey::of::<K>(), options)?;
        downcast_instance::<K>(&instance).map_err(|kind| self.error(kind))
    }

    /// Locates the export registered under `key`.
    ///
    /// # Errors
    /// See [`Self::locate_instance`]
    #[inline]
    pub fn locate_keyed<K: ?Sized + Send + Sync + 'static>(&self, key: impl Into<LocateKey>) -> Result<Arc<K>, LocateError> {
        self.locate_with(LocateOptions::new().with_key(key))
    }

    /// Like [`Self::locate`], but returns `Ok(None)` if nothing can produce `K`.
    ///
    /// # Errors
    /// Returns construction failures of a matching strategy.
    pub fn try_locate<K: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<K>>, LocateError> {
        let requested = ExportKey::of::<K>();
        let span = info_span!("try_locate", export = %requested, scope = self.name());
        let _guard = span.enter();

        match self.locate_located(&requested, LocateOptions::new()) {
            Ok(Some(Located { instance, .. })) => downcast_instance::<K>(&instance).map(Some).map_err(|kind| self.error(kind)),
            Ok(None) => {
                debug!("Not found");
                Ok(None)
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Locates every instance exported as `K` in the scope chain, child scopes first,
    /// then by priority and registration order.
    ///
    /// # Errors
    /// Returns construction failures, never a failure for nothing being found.
    #[inline]
    pub fn locate_all<K: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<K>>, LocateError> {
        self.locate_all_with(LocateOptions::new())
    }

    /// # Errors
    /// See [`Self::locate_all`]
    pub fn locate_all_with<K: ?Sized + Send + Sync + 'static>(&self, options: LocateOptions) -> Result<Vec<Arc<K>>, LocateError> {
        let requested = ExportKey::of::<K>();
        let span = info_span!("locate_all", export = %requested, scope = self.name());
        let _guard = span.enter();

        self.ensure_open().inspect_err(|err| error!("{}", err))?;
        let extra = self.scope_extra().merged(&options.extra);
        let mut context = InjectionContext::new(self, extra, options.key.clone());
        let request = LocateRequest {
            requested: &requested,
            key: options.key.as_ref(),
            site: None,
            filter: options.filter.as_ref(),
        };
        let located = self.resolve_all(&request, &mut context).inspect_err(|err| error!("{}", err))?;
        located
            .iter()
            .map(|located| downcast_instance::<K>(&located.instance).map_err(|kind| self.error(kind)))
            .collect()
    }

    /// Locates a runtime type, e.g. a closed generic built from a [`crate::GenericDef`].
    ///
    /// # Errors
    /// See [`Self::locate_instance`]
    #[inline]
    pub fn locate_type(&self, ty: &TypeRef) -> Result<Instance, LocateError> {
        self.locate_instance(&ExportKey::Type(ty.clone()), LocateOptions::new())
    }

    /// # Errors
    /// See [`Self::locate_instance`]
    #[inline]
    pub fn locate_name(&self, name: &str) -> Result<Instance, LocateError> {
        self.locate_instance(&ExportKey::name(name), LocateOptions::new())
    }

    /// Returns `true` if a strategy for `K`, or a built-in wrapper fallback, is visible from this scope.
    ///
    /// Conditions aren't evaluated.
    #[inline]
    #[must_use]
    pub fn can_locate<K: ?Sized + 'static>(&self) -> bool {
        self.can_resolve(&ExportKey::of::<K>(), None)
    }

    /// Deferred locate of `K` from this scope, located on first use.
    #[inline]
    #[must_use]
    pub fn lazy<K: ?Sized + Send + Sync + 'static>(&self) -> Lazy<K> {
        Lazy::new(self.deferred::<K>())
    }

    /// Locates `K` from this scope on every call.
    #[inline]
    #[must_use]
    pub fn factory<K: ?Sized + Send + Sync + 'static>(&self) -> Factory<K> {
        Factory::new(self.deferred::<K>())
    }

    /// Locates `K` together with the metadata of the strategy that produced it.
    ///
    /// # Errors
    /// See [`Self::locate_instance`]
    pub fn meta<K: ?Sized + Send + Sync + 'static>(&self) -> Result<Meta<K>, LocateError> {
        let requested = ExportKey::of::<K>();
        let span = info_span!("meta", export = %requested, scope = self.name());
        let _guard = span.enter();

        let Some(Located { instance, strategy }) = self.locate_located(&requested, LocateOptions::new())? else {
            let err = self.error(LocateErrorKind::CannotLocateExport { requested });
            error!("{}", err);
            return Err(err);
        };
        let value = downcast_instance::<K>(&instance).map_err(|kind| self.error(kind))?;
        let metadata = strategy.map(|strategy| strategy.metadata().clone()).unwrap_or_default();
        Ok(Meta::new(value, metadata))
    }

    /// Adds a locator consulted when nothing is registered for a request.
    ///
    /// Locators are shared by the whole scope tree and asked in registration order.
    pub fn add_secondary_locator(&self, locator: impl SecondaryLocator + 'static) {
        self.inner.shared.secondary.thread_safe_add(Arc::new(locator) as Arc<dyn SecondaryLocator>);
        debug!("Secondary locator added");
    }

    /// Adds a provider asked to register a strategy when nothing can produce a request.
    ///
    /// Provided strategies are registered in the root container.
    pub fn add_missing_export_provider(&self, provider: impl MissingExportStrategyProvider + 'static) {
        self.inner
            .shared
            .missing
            .thread_safe_add(Arc::new(provider) as Arc<dyn MissingExportStrategyProvider>);
        debug!("Missing export provider added");
    }

    /// Removes a strategy of this scope, see [`crate::ExportStrategy::id`].
    ///
    /// Resolutions already in flight keep using it. Returns `false` if the scope doesn't own it.
    pub fn remove_strategy(&self, id: u64) -> bool {
        let removed_from = |tree: &StrategyTree| {
            tree.update(|strategies| {
                let mut next = strategies.clone();
                let mut removed = false;
                for (key, collection) in strategies.iter() {
                    let Some(remaining) = collection.removed(id) else {
                        continue;
                    };
                    removed = true;
                    next = if remaining.is_empty() {
                        next.remove(key).map_or(next.clone(), |(next, _)| next)
                    } else {
                        next.insert_or_update(key.clone(), remaining)
                    };
                }
                removed.then_some((next, ()))
            })
            .is_some()
        };

        let removed = removed_from(&self.inner.strategies) | removed_from(&self.inner.decorators);
        if removed {
            self.inner.shared.generation.fetch_add(1, Ordering::AcqRel);
            debug!(strategy = id, scope = self.name(), "Strategy removed");
        }
        removed
    }

    /// Closes the scope, disposing its tracked instances in reverse registration order.
    ///
    /// Instances cached in the scope are dropped, later locates from it fail with
    /// [`LocateErrorKind::ScopeClosed`]. Calling it again is a no-op.
    ///
    /// # Errors
    /// Returns [`DisposalErrorKind::Aggregate`] with every failing finalizer, after all of them ran.
    #[inline]
    pub fn close(&self) -> Result<(), DisposalErrorKind> {
        self.inner.close()
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Name of the scope, `None` for the root container and unnamed scopes.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.shared.config
    }

    /// Type descriptors shared by the scope tree.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.inner.shared.types
    }

    #[inline]
    #[must_use]
    pub fn disposal_scope(&self) -> Option<&Arc<DisposalScope>> {
        self.inner.disposal.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Container {
    fn child(&self, name: Option<Arc<str>>, extra: ExtraData, disposal: Option<Arc<DisposalScope>>) -> Container {
        let child = Container {
            inner: Arc::new(ContainerInner::new(
                Some(self.clone()),
                name,
                self.inner.shared.clone(),
                extra,
                disposal,
            )),
        };
        debug!(scope = child.name(), parent = self.name(), "Child scope created");
        child
    }

    #[inline]
    fn error(&self, kind: LocateErrorKind) -> LocateError {
        LocateError::new(kind, self.config().trail_capacity)
    }

    fn deferred<K: ?Sized + 'static>(&self) -> DeferredLocate {
        DeferredLocate::new(self, ExportKey::of::<K>(), None, ExtraData::new())
    }

    /// Extra data of the scope chain, child values winning.
    fn scope_extra(&self) -> ExtraData {
        self.scopes()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .fold(ExtraData::new(), |extra, scope| extra.merged(&scope.inner.extra))
    }

    #[inline]
    pub(crate) fn cache(&self) -> &ScopeCache {
        &self.inner.cache
    }

    #[inline]
    pub(crate) fn disposal_target(&self) -> DisposalTarget {
        match &self.inner.disposal {
            Some(scope) => DisposalTarget::Scope(scope.clone()),
            None => DisposalTarget::Missing,
        }
    }

    /// This scope and its ancestors, nearest first.
    #[inline]
    pub(crate) fn scopes(&self) -> impl Iterator<Item = &Container> {
        iter::successors(Some(self), |scope| scope.inner.parent.as_ref())
    }

    #[inline]
    pub(crate) fn root(&self) -> &Container {
        self.scopes().last().unwrap_or(self)
    }

    /// Nearest scope named `name`, starting with this one.
    pub(crate) fn find_scope(&self, name: &str) -> Option<Container> {
        self.scopes().find(|scope| scope.name() == Some(name)).cloned()
    }

    /// Adds `entries` to `tree` of this scope in one publication.
    pub(crate) fn publish(&self, tree: &StrategyTree, entries: &[(StorageKey, Arc<ExportStrategy>)]) {
        if entries.is_empty() {
            return;
        }
        tree.update(|strategies| {
            let mut next = strategies.clone();
            for (key, strategy) in entries {
                let collection = match next.get(key) {
                    Some(collection) => collection.added(strategy.clone()),
                    None => StrategyCollection::single(strategy.clone()),
                };
                next = next.insert_or_update(key.clone(), collection);
            }
            Some((next, ()))
        });
        self.inner.shared.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Constructor picked for the plan slot `slot` when activated from this scope.
    ///
    /// The choice is remembered until strategies are registered or removed anywhere in the tree,
    /// failures are never remembered.
    pub(crate) fn selected_constructor(
        &self,
        slot: u64,
        select: impl FnOnce() -> Result<usize, ConfigurationErrorKind>,
    ) -> Result<usize, ConfigurationErrorKind> {
        let generation = self.inner.shared.generation.load(Ordering::Acquire);
        if let Some((seen, index)) = self.inner.selections.get(&slot) {
            if seen == generation {
                return Ok(index);
            }
        }
        let index = select()?;
        self.inner.selections.thread_safe_update(slot, (generation, index));
        Ok(index)
    }

    /// Fails with [`LocateErrorKind::ScopeClosed`] once this scope was closed.
    pub(crate) fn check_open(&self, context: &InjectionContext) -> Result<(), LocateError> {
        if self.is_closed() {
            return Err(context.error(self.closed_kind()));
        }
        Ok(())
    }

    #[inline]
    fn closed_kind(&self) -> LocateErrorKind {
        LocateErrorKind::ScopeClosed {
            scope: self.inner.name.clone(),
        }
    }

    fn ensure_open(&self) -> Result<(), LocateError> {
        if self.is_closed() {
            return Err(self.error(self.closed_kind()));
        }
        Ok(())
    }
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("strategies", &self.inner.strategies.len())
            .field("decorators", &self.inner.decorators.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Weak handle to a scope, see [`Container::downgrade`].
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    #[inline]
    #[must_use]
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl Debug for WeakContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContainer")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

enum ChildDisposal {
    Owned,
    Provided(Box<dyn DisposalScopeProvider>),
    Disabled,
}

type Registrations = Box<dyn FnOnce(&mut RegistrationBlock)>;

pub struct ChildContainerBuilder {
    container: Container,
    name: Option<Arc<str>>,
    registrations: Option<Registrations>,
    extra: ExtraData,
    disposal: ChildDisposal,
}

impl ChildContainerBuilder {
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Strategies registered in the child scope only, invisible to the parent.
    #[inline]
    #[must_use]
    pub fn with_registrations(mut self, registrations: impl FnOnce(&mut RegistrationBlock) + 'static) -> Self {
        self.registrations = Some(Box::new(registrations));
        self
    }

    /// Extra data available to every locate from the child scope.
    #[inline]
    #[must_use]
    pub fn with_extra(mut self, extra: ExtraData) -> Self {
        self.extra = extra;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_disposal_provider(mut self, provider: impl DisposalScopeProvider + 'static) -> Self {
        self.disposal = ChildDisposal::Provided(Box::new(provider));
        self
    }

    /// The child scope gets no disposal scope: locating anything with a finalizer from it fails
    /// with [`LocateErrorKind::DisposalScopeMissing`].
    #[inline]
    #[must_use]
    pub fn without_disposal(mut self) -> Self {
        self.disposal = ChildDisposal::Disabled;
        self
    }

    /// Creates the child scope.
    ///
    /// # Errors
    /// Returns the first invalid registration of [`Self::with_registrations`].
    pub fn build(self) -> Result<Container, ConfigurationErrorKind> {
        let disposal = match self.disposal {
            ChildDisposal::Owned => Some(Arc::new(DisposalScope::new())),
            ChildDisposal::Provided(provider) => Some(provider.provide(self.name.as_deref())),
            ChildDisposal::Disabled => None,
        };
        let child = self.container.child(self.name, self.extra, disposal);
        if let Some(registrations) = self.registrations {
            child.configure(registrations)?;
        }
        Ok(child)
    }
}

/// Child scope closed on drop, see [`Container::begin_lifetime_scope`].
pub struct LifetimeScope {
    container: Container,
}

impl LifetimeScope {
    /// Handle that outlives the guard. The scope is still closed when the guard drops.
    #[inline]
    #[must_use]
    pub fn container(&self) -> Container {
        self.container.clone()
    }
}

impl Deref for LifetimeScope {
    type Target = Container;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.container
    }
}

impl Drop for LifetimeScope {
    fn drop(&mut self) {
        if let Err(err) = self.container.close() {
            error!("{}", err);
        }
        debug!(scope = self.container.name(), "Lifetime scope ended");
    }
}

pub(crate) struct ContainerInner {
    id: u64,
    name: Option<Arc<str>>,
    parent: Option<Container>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) strategies: StrategyTree,
    pub(crate) decorators: StrategyTree,
    extra: ExtraData,
    cache: ScopeCache,
    selections: SharedTree<u64, (u64, usize)>,
    disposal: Option<Arc<DisposalScope>>,
    closed: AtomicBool,
}

impl ContainerInner {
    fn new(
        parent: Option<Container>,
        name: Option<Arc<str>>,
        shared: Arc<Shared>,
        extra: ExtraData,
        disposal: Option<Arc<DisposalScope>>,
    ) -> Self {
        Self {
            id: unique_id(),
            name,
            parent,
            shared,
            strategies: StrategyTree::new(),
            decorators: StrategyTree::new(),
            extra,
            cache: ScopeCache::new(),
            selections: SharedTree::new(),
            disposal,
            closed: AtomicBool::new(false),
        }
    }

    fn close(&self) -> Result<(), DisposalErrorKind> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let result = match &self.disposal {
            Some(disposal) => disposal.dispose(),
            None => Ok(()),
        };
        self.cache.clear();
        debug!(scope = self.name.as_deref(), "Container closed");
        result
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            error!("{}", err);
        }
        debug!("Container closed on drop");
    }
}
