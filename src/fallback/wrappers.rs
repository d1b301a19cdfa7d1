use alloc::sync::Arc;
use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};
use parking_lot::Mutex;

use crate::{
    any::Instance,
    container::{Container, LocateOptions, WeakContainer},
    context::ExtraData,
    errors::{LocateError, LocateErrorKind},
    inject::downcast_instance,
    strategy::{ExportKey, LocateKey, Metadata},
};

/// Locate call captured for later, against the scope that requested it.
///
/// Holds the scope weakly: a deferred locate outliving its scope fails with
/// [`LocateErrorKind::ContainerDropped`].
#[derive(Clone)]
pub struct DeferredLocate {
    container: WeakContainer,
    requested: ExportKey,
    key: Option<LocateKey>,
    extra: ExtraData,
}

impl DeferredLocate {
    #[inline]
    #[must_use]
    pub(crate) fn new(container: &Container, requested: ExportKey, key: Option<LocateKey>, extra: ExtraData) -> Self {
        Self {
            container: container.downgrade(),
            requested,
            key,
            extra,
        }
    }

    #[inline]
    #[must_use]
    pub const fn requested(&self) -> &ExportKey {
        &self.requested
    }

    pub(crate) fn locate(&self, extra: Option<&ExtraData>, key: Option<LocateKey>) -> Result<Instance, LocateError> {
        let Some(container) = self.container.upgrade() else {
            return Err(LocateErrorKind::ContainerDropped {
                requested: self.requested.clone(),
            }
            .into());
        };
        let extra = match extra {
            Some(extra) => self.extra.merged(extra),
            None => self.extra.clone(),
        };
        let mut options = LocateOptions::new().with_extra(extra);
        if let Some(key) = key.or_else(|| self.key.clone()) {
            options = options.with_key(key);
        }
        container.locate_instance(&self.requested, options)
    }
}

impl Debug for DeferredLocate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredLocate")
            .field("requested", &self.requested)
            .field("key", &self.key)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

#[inline]
fn typed<K: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Result<Arc<K>, LocateError> {
    downcast_instance::<K>(instance).map_err(Into::into)
}

/// Located on first use, then cached. Clones share the cached value.
pub struct Lazy<K: ?Sized> {
    deferred: DeferredLocate,
    value: Arc<Mutex<Option<Arc<K>>>>,
}

impl<K: ?Sized + Send + Sync + 'static> Lazy<K> {
    #[inline]
    #[must_use]
    pub(crate) fn new(deferred: DeferredLocate) -> Self {
        Self {
            deferred,
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// # Errors
    /// Returns the error of the deferred locate, a failed locate is retried on the next call.
    pub fn value(&self) -> Result<Arc<K>, LocateError> {
        let mut guard = self.value.lock();
        if let Some(value) = &*guard {
            return Ok(value.clone());
        }
        let value = typed::<K>(&self.deferred.locate(None, None)?)?;
        *guard = Some(value.clone());
        Ok(value)
    }

    #[inline]
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<K: ?Sized> Clone for Lazy<K> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            value: self.value.clone(),
        }
    }
}

/// Locates a new instance on every call.
pub struct Factory<K: ?Sized> {
    deferred: DeferredLocate,
    _marker: PhantomData<fn() -> Arc<K>>,
}

impl<K: ?Sized + Send + Sync + 'static> Factory<K> {
    #[inline]
    #[must_use]
    pub(crate) fn new(deferred: DeferredLocate) -> Self {
        Self {
            deferred,
            _marker: PhantomData,
        }
    }

    /// # Errors
    /// Returns the error of the locate call.
    #[inline]
    pub fn create(&self) -> Result<Arc<K>, LocateError> {
        typed::<K>(&self.deferred.locate(None, None)?)
    }

    /// Locates with `extra` merged over the extra data captured with the factory.
    ///
    /// # Errors
    /// Returns the error of the locate call.
    #[inline]
    pub fn create_with(&self, extra: &ExtraData) -> Result<Arc<K>, LocateError> {
        typed::<K>(&self.deferred.locate(Some(extra), None)?)
    }
}

impl<K: ?Sized> Clone for Factory<K> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            _marker: PhantomData,
        }
    }
}

/// Locates the export registered under the key passed to every call.
pub struct KeyedFactory<K: ?Sized> {
    deferred: DeferredLocate,
    _marker: PhantomData<fn() -> Arc<K>>,
}

impl<K: ?Sized + Send + Sync + 'static> KeyedFactory<K> {
    #[inline]
    #[must_use]
    pub(crate) fn new(deferred: DeferredLocate) -> Self {
        Self {
            deferred,
            _marker: PhantomData,
        }
    }

    /// # Errors
    /// Returns the error of the locate call.
    #[inline]
    pub fn create(&self, key: impl Into<LocateKey>) -> Result<Arc<K>, LocateError> {
        typed::<K>(&self.deferred.locate(None, Some(key.into()))?)
    }

    /// # Errors
    /// Returns the error of the locate call.
    #[inline]
    pub fn create_with(&self, key: impl Into<LocateKey>, extra: &ExtraData) -> Result<Arc<K>, LocateError> {
        typed::<K>(&self.deferred.locate(Some(extra), Some(key.into()))?)
    }
}

impl<K: ?Sized> Clone for KeyedFactory<K> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            _marker: PhantomData,
        }
    }
}

/// Instance together with the metadata of the strategy that produced it.
pub struct Meta<K: ?Sized> {
    value: Arc<K>,
    metadata: Metadata,
}

impl<K: ?Sized> Meta<K> {
    #[inline]
    #[must_use]
    pub const fn new(value: Arc<K>, metadata: Metadata) -> Self {
        Self { value, metadata }
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> &Arc<K> {
        &self.value
    }

    #[inline]
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Arc<K> {
        self.value
    }
}

impl<K: ?Sized> Clone for Meta<K> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Untyped [`Lazy`], what a locate of `Lazy<T>` by type reference produces.
pub struct LazyInstance {
    deferred: DeferredLocate,
    value: Mutex<Option<Instance>>,
}

impl LazyInstance {
    #[inline]
    #[must_use]
    pub(crate) fn new(deferred: DeferredLocate) -> Self {
        Self {
            deferred,
            value: Mutex::new(None),
        }
    }

    /// # Errors
    /// Returns the error of the deferred locate.
    pub fn value(&self) -> Result<Instance, LocateError> {
        let mut guard = self.value.lock();
        if let Some(value) = &*guard {
            return Ok(value.clone());
        }
        let value = self.deferred.locate(None, None)?;
        *guard = Some(value.clone());
        Ok(value)
    }
}

/// Untyped [`Factory`].
pub struct FactoryInstance {
    deferred: DeferredLocate,
}

impl FactoryInstance {
    #[inline]
    #[must_use]
    pub(crate) const fn new(deferred: DeferredLocate) -> Self {
        Self { deferred }
    }

    /// # Errors
    /// Returns the error of the locate call.
    #[inline]
    pub fn create(&self) -> Result<Instance, LocateError> {
        self.deferred.locate(None, None)
    }
}

/// Untyped [`KeyedFactory`].
pub struct KeyedFactoryInstance {
    deferred: DeferredLocate,
}

impl KeyedFactoryInstance {
    #[inline]
    #[must_use]
    pub(crate) const fn new(deferred: DeferredLocate) -> Self {
        Self { deferred }
    }

    /// # Errors
    /// Returns the error of the locate call.
    #[inline]
    pub fn create(&self, key: impl Into<LocateKey>) -> Result<Instance, LocateError> {
        self.deferred.locate(None, Some(key.into()))
    }
}

/// Untyped [`Meta`].
#[derive(Debug, Clone)]
pub struct MetaInstance {
    instance: Instance,
    metadata: Metadata,
}

impl MetaInstance {
    #[inline]
    #[must_use]
    pub(crate) const fn new(instance: Instance, metadata: Metadata) -> Self {
        Self { instance, metadata }
    }

    #[inline]
    #[must_use]
    pub const fn instance(&self) -> &Instance {
        &self.instance
    }

    #[inline]
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
