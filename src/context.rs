use alloc::{collections::BTreeMap, sync::Arc};
use core::fmt::{self, Debug, Formatter};
use parking_lot::Mutex;

use crate::{
    any::Instance,
    container::Container,
    disposal::DisposalScope,
    errors::{LocateError, LocateErrorKind},
    finalizer::BoxedCloneFinalizer,
    immutable::{ImmutableList, ImmutableTree, SharedTree},
    strategy::{LocateKey, MemberKind},
    types::{Attributes, TypeRef},
};

/// Ambient values passed to a locate call.
///
/// Dependencies are satisfied from extra data before the scope chain is searched:
/// first by parameter name, then by type.
#[derive(Clone, Default)]
pub struct ExtraData {
    by_type: ImmutableTree<TypeRef, Instance>,
    by_name: ImmutableTree<Arc<str>, Instance>,
}

impl ExtraData {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn insert<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.insert_rc(Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn insert_rc<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.by_type = self.by_type.insert_or_update(TypeRef::of::<T>(), Instance::new(value));
        self
    }

    /// Inserts a value seen as `K`, e.g. `Arc<dyn Service>`.
    #[inline]
    #[must_use]
    pub fn insert_as<K: ?Sized + Send + Sync + 'static>(mut self, value: Arc<K>) -> Self {
        self.by_type = self.by_type.insert_or_update(TypeRef::of::<K>(), Instance::from_view(value));
        self
    }

    #[inline]
    #[must_use]
    pub fn insert_instance(mut self, ty: TypeRef, value: Instance) -> Self {
        self.by_type = self.by_type.insert_or_update(ty, value);
        self
    }

    #[inline]
    #[must_use]
    pub fn insert_named<T: Send + Sync + 'static>(mut self, name: impl Into<Arc<str>>, value: T) -> Self {
        self.by_name = self.by_name.insert_or_update(name.into(), Instance::from_value(value));
        self
    }

    #[inline]
    #[must_use]
    pub fn get<K: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<K>> {
        self.by_type.get(&TypeRef::of::<K>()).and_then(|value| value.downcast::<K>())
    }

    #[inline]
    #[must_use]
    pub fn get_named<K: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Option<Arc<K>> {
        self.by_name.get(name).and_then(|value| value.downcast::<K>())
    }

    #[inline]
    pub(crate) fn by_type(&self, ty: &TypeRef) -> Option<&Instance> {
        self.by_type.get(ty)
    }

    #[inline]
    pub(crate) fn by_name(&self, name: &str) -> Option<&Instance> {
        self.by_name.get(name)
    }

    /// Values of `other` win over values of `self`.
    #[must_use]
    pub fn merged(&self, other: &ExtraData) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        let mut merged = self.clone();
        for (ty, value) in other.by_type.iter() {
            merged.by_type = merged.by_type.insert_or_update(ty.clone(), value.clone());
        }
        for (name, value) in other.by_name.iter() {
            merged.by_name = merged.by_name.insert_or_update(name.clone(), value.clone());
        }
        merged
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_name.is_empty()
    }
}

impl Debug for ExtraData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraData")
            .field("types", &self.by_type.keys().collect::<alloc::vec::Vec<_>>())
            .field("names", &self.by_name.keys().collect::<alloc::vec::Vec<_>>())
            .finish()
    }
}

/// Where instances activated by the current resolution are tracked for disposal.
#[derive(Clone)]
pub(crate) enum DisposalTarget {
    Scope(Arc<DisposalScope>),
    /// Instances are intentionally not tracked, e.g. weak singletons.
    Untracked,
    /// The scope was created without a disposal scope.
    Missing,
}

pub(crate) type ObjectGraph = Arc<Mutex<BTreeMap<u64, Instance>>>;

/// Instance under construction, visible to everything it depends on.
#[derive(Clone)]
pub(crate) struct AncestorFrame {
    pub(crate) activation_type: TypeRef,
    pub(crate) store: ObjectGraph,
}

/// Per-call state of one resolution.
///
/// Created for every top-level locate and cloned for every nested activation,
/// so parallel resolutions never see each other's extra data.
#[derive(Clone)]
pub struct InjectionContext {
    pub(crate) requesting: Container,
    pub(crate) disposal: DisposalTarget,
    pub(crate) extra: ExtraData,
    pub(crate) key: Option<LocateKey>,
    pub(crate) depth: u16,
    pub(crate) max_depth: u16,
    pub(crate) trail_capacity: usize,
    pub(crate) graph: ObjectGraph,
    pub(crate) ancestors: ImmutableList<AncestorFrame>,
    pub(crate) decorated: Option<Instance>,
}

impl InjectionContext {
    #[must_use]
    pub(crate) fn new(requesting: &Container, extra: ExtraData, key: Option<LocateKey>) -> Self {
        let config = requesting.config();
        Self {
            requesting: requesting.clone(),
            disposal: requesting.disposal_target(),
            extra,
            key,
            depth: 0,
            max_depth: config.max_resolve_depth,
            trail_capacity: config.trail_capacity,
            graph: ObjectGraph::default(),
            ancestors: ImmutableList::new(),
            decorated: None,
        }
    }

    /// Context for activating `activation_type` one level deeper.
    ///
    /// # Errors
    /// Returns [`LocateErrorKind::CircularDependency`] once the depth limit is exceeded.
    pub(crate) fn nested(&self, activation_type: &TypeRef) -> Result<Self, LocateError> {
        if self.depth >= self.max_depth {
            return Err(self.error(LocateErrorKind::CircularDependency { max_depth: self.max_depth }));
        }
        let mut nested = self.clone();
        nested.depth += 1;
        nested.ancestors = self.ancestors.add(AncestorFrame {
            activation_type: activation_type.clone(),
            store: ObjectGraph::default(),
        });
        Ok(nested)
    }

    /// Context for locating one dependency of the current activation.
    #[must_use]
    pub(crate) fn for_dependency(&self) -> Self {
        let mut context = self.clone();
        context.decorated = None;
        context
    }

    /// Resolves from `scope` and tracks disposables there.
    #[must_use]
    pub fn for_scope(&self, scope: &Container) -> Self {
        let mut context = self.clone();
        context.requesting = scope.clone();
        context.disposal = scope.disposal_target();
        context
    }

    /// Keeps resolving from the same scope without tracking disposables.
    #[must_use]
    pub fn untracked(&self) -> Self {
        let mut context = self.clone();
        context.disposal = DisposalTarget::Untracked;
        context
    }

    #[inline]
    #[must_use]
    pub fn error(&self, kind: LocateErrorKind) -> LocateError {
        LocateError::new(kind, self.trail_capacity)
    }

    pub(crate) fn track(
        &self,
        name: &'static str,
        instance: &Instance,
        finalizer: BoxedCloneFinalizer,
        activation_type: &TypeRef,
    ) -> Result<(), LocateError> {
        match &self.disposal {
            DisposalTarget::Scope(scope) => scope.track(name, instance.erased(), finalizer).map_err(|source| {
                self.error(LocateErrorKind::DisposalScopeClosed {
                    activation_type: activation_type.clone(),
                    source,
                })
            }),
            DisposalTarget::Untracked => Ok(()),
            DisposalTarget::Missing => Err(self.error(LocateErrorKind::DisposalScopeMissing {
                activation_type: activation_type.clone(),
            })),
        }
    }

    /// Scope the resolution searches strategies in.
    #[inline]
    #[must_use]
    pub const fn requesting(&self) -> &Container {
        &self.requesting
    }

    #[inline]
    #[must_use]
    pub const fn extra(&self) -> &ExtraData {
        &self.extra
    }

    /// Key passed to the locate call, if any.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> Option<&LocateKey> {
        self.key.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn depth(&self) -> u16 {
        self.depth
    }

    /// Types being activated above the current one, nearest first.
    #[inline]
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeRef> {
        self.ancestors.iter().map(|frame| &frame.activation_type)
    }
}

impl Debug for InjectionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionContext")
            .field("scope", &self.requesting.name())
            .field("extra", &self.extra)
            .field("key", &self.key)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// Static description of the place a dependency is injected into.
///
/// Condition results that only depend on the site are cached here per strategy and activation type.
pub struct InjectionSite {
    pub(crate) injected_type: TypeRef,
    pub(crate) member: MemberKind,
    pub(crate) member_name: Option<Arc<str>>,
    pub(crate) member_attributes: Attributes,
    pub(crate) class_attributes: Attributes,
    pub(crate) target_attributes: Attributes,
    pub(crate) conditions: SharedTree<(u64, TypeRef), bool>,
}

impl InjectionSite {
    #[must_use]
    pub(crate) fn new(injected_type: TypeRef, member: MemberKind) -> Self {
        Self {
            injected_type,
            member,
            member_name: None,
            member_attributes: Attributes::new(),
            class_attributes: Attributes::new(),
            target_attributes: Attributes::new(),
            conditions: SharedTree::new(),
        }
    }

    /// Type the dependency is injected into.
    #[inline]
    #[must_use]
    pub const fn injected_type(&self) -> &TypeRef {
        &self.injected_type
    }

    #[inline]
    #[must_use]
    pub const fn member(&self) -> MemberKind {
        self.member
    }

    #[inline]
    #[must_use]
    pub fn member_name(&self) -> Option<&str> {
        self.member_name.as_deref()
    }

    /// Attributes of the parameter or member.
    #[inline]
    #[must_use]
    pub const fn member_attributes(&self) -> &Attributes {
        &self.member_attributes
    }

    /// Attributes of the type the dependency is injected into.
    #[inline]
    #[must_use]
    pub const fn class_attributes(&self) -> &Attributes {
        &self.class_attributes
    }

    /// Attributes of the requested type.
    #[inline]
    #[must_use]
    pub const fn target_attributes(&self) -> &Attributes {
        &self.target_attributes
    }
}

impl Debug for InjectionSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionSite")
            .field("injected_type", &self.injected_type)
            .field("member", &self.member)
            .field("member_name", &self.member_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ExtraData;

    use alloc::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn test_extra_data_lookup() {
        let extra = ExtraData::new()
            .insert(5_u32)
            .insert_as(Arc::new(English) as Arc<dyn Greeter>)
            .insert_named("retries", 3_u8);

        assert_eq!(*extra.get::<u32>().unwrap(), 5);
        assert_eq!(extra.get::<dyn Greeter>().unwrap().greet(), "hello");
        assert_eq!(*extra.get_named::<u8>("retries").unwrap(), 3);
        assert!(extra.get_named::<u32>("retries").is_none());
    }

    #[test]
    fn test_merged_prefers_other() {
        let base = ExtraData::new().insert(1_u32).insert(true);
        let merged = base.merged(&ExtraData::new().insert(2_u32));

        assert_eq!(*merged.get::<u32>().unwrap(), 2);
        assert!(*merged.get::<bool>().unwrap());
    }
}
