use alloc::sync::{Arc, Weak};
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
};

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;
type WeakAny = Weak<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let name = self.name.split_once('<').map_or(self.name, |(head, _)| head);
        name.rsplit_once("::").map_or(name, |(_, name)| name)
    }
}

/// Type-erased shared value produced by the container.
///
/// Keeps the concrete allocation (`Arc<T>`) together with the view it was exported as
/// (`Arc<K>`, e.g. `Arc<dyn Service>`), so the same instance can be cast again,
/// compared by identity and weakly referenced.
#[derive(Clone)]
pub struct Instance {
    value: RcAny,
    view: RcAny,
    value_type: TypeInfo,
    view_type: TypeInfo,
    rewrap: fn(RcAny) -> Option<Instance>,
}

impl Instance {
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: value.clone(),
            view: Arc::new(value),
            value_type: TypeInfo::of::<T>(),
            view_type: TypeInfo::of::<T>(),
            rewrap: |value| value.downcast::<T>().ok().map(Instance::new),
        }
    }

    #[inline]
    #[must_use]
    pub fn from_value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// Wraps an already erased view, e.g. `Arc<dyn Service>`, that has no concrete type to go back to.
    #[must_use]
    pub fn from_view<K: ?Sized + Send + Sync + 'static>(view: Arc<K>) -> Self {
        let view: RcAny = Arc::new(view);
        Self {
            value: view.clone(),
            view,
            value_type: TypeInfo::of::<K>(),
            view_type: TypeInfo::of::<K>(),
            rewrap: |_| None,
        }
    }

    /// The same allocation seen as `K`.
    #[must_use]
    pub fn with_view<K: ?Sized + Send + Sync + 'static>(&self, view: Arc<K>) -> Self {
        Self {
            value: self.value.clone(),
            view: Arc::new(view),
            value_type: self.value_type,
            view_type: TypeInfo::of::<K>(),
            rewrap: self.rewrap,
        }
    }

    /// Drops the export view, going back to the concrete type.
    #[inline]
    #[must_use]
    pub fn concrete(&self) -> Self {
        (self.rewrap)(self.value.clone()).unwrap_or_else(|| self.clone())
    }

    /// Returns the view if the instance is currently seen as `K`.
    #[inline]
    #[must_use]
    pub fn downcast<K: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<K>> {
        self.view.downcast_ref::<Arc<K>>().cloned()
    }

    /// Returns the concrete allocation if its type is `T`.
    #[inline]
    #[must_use]
    pub fn downcast_value<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    #[inline]
    #[must_use]
    pub fn is<K: ?Sized + 'static>(&self) -> bool {
        self.view_type.id == TypeId::of::<K>()
    }

    #[inline]
    #[must_use]
    pub const fn value_type(&self) -> TypeInfo {
        self.value_type
    }

    #[inline]
    #[must_use]
    pub const fn view_type(&self) -> TypeInfo {
        self.view_type
    }

    #[inline]
    #[must_use]
    pub(crate) fn erased(&self) -> RcAny {
        self.value.clone()
    }

    /// Returns `true` if both instances share the concrete allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }

    #[inline]
    #[must_use]
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance {
            value: Arc::downgrade(&self.value),
            rewrap: self.rewrap,
        }
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("value_type", &self.value_type.name)
            .field("view_type", &self.view_type.name)
            .finish_non_exhaustive()
    }
}

/// Weak reference to the concrete allocation of an [`Instance`].
#[derive(Clone)]
pub struct WeakInstance {
    value: WeakAny,
    rewrap: fn(RcAny) -> Option<Instance>,
}

impl WeakInstance {
    /// Restores the instance with its concrete view, if the allocation is still alive.
    #[inline]
    #[must_use]
    pub fn upgrade(&self) -> Option<Instance> {
        self.value.upgrade().and_then(self.rewrap)
    }
}

impl Debug for WeakInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakInstance")
            .field("alive", &(self.value.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Instance, TypeInfo};

    use alloc::sync::Arc;

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Service;

    impl Named for Service {
        fn name(&self) -> &'static str {
            "service"
        }
    }

    #[test]
    fn test_views_share_allocation() {
        let instance = Instance::from_value(Service);
        let concrete = instance.downcast::<Service>().unwrap();
        let named = instance.with_view(concrete.clone() as Arc<dyn Named>);

        assert_eq!(named.downcast::<dyn Named>().unwrap().name(), "service");
        assert!(named.downcast::<Service>().is_none());
        assert!(named.concrete().downcast::<Service>().is_some());
        assert!(named.ptr_eq(&instance));
        assert!(named.is::<dyn Named>());
        assert_eq!(named.value_type(), TypeInfo::of::<Service>());
    }

    #[test]
    fn test_weak_upgrade() {
        let instance = Instance::from_value(Service);
        let weak = instance.downgrade();

        assert!(weak.upgrade().unwrap().ptr_eq(&instance));
        drop(instance);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Service>().short_name(), "Service");
        assert_eq!(TypeInfo::of::<alloc::vec::Vec<u8>>().short_name(), "Vec");
    }
}
