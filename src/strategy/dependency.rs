use alloc::sync::Arc;
use core::fmt::{self, Debug, Formatter};

use super::{ExportKey, LocateKey};
use crate::{
    any::Instance,
    types::{Attribute, Attributes},
};

/// How a declared dependency is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// One located instance.
    Single,
    /// One located instance or nothing.
    Optional,
    /// Every matching export, possibly none.
    All,
    /// Deferred locate, performed on first use and cached.
    Lazy,
    /// Deferred locate, performed on every call.
    Factory,
    /// Deferred keyed locate, the key is supplied on every call.
    KeyedFactory,
    /// Located instance together with its strategy metadata.
    Meta,
    /// The instance being decorated, only available to decorators.
    Decorated,
    /// Type arguments of the closed activation type.
    TypeArgs,
}

/// Where a dependency is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Constructor parameter at the index.
    Constructor(usize),
    Property,
    Method,
}

/// Declared dependency of a constructor, property or method.
#[derive(Clone)]
pub struct DependencyInfo {
    pub(crate) kind: DependencyKind,
    pub(crate) requested: ExportKey,
    pub(crate) name: Option<Arc<str>>,
    pub(crate) key: Option<LocateKey>,
    pub(crate) optional: bool,
    pub(crate) default: Option<Instance>,
    pub(crate) attributes: Attributes,
    pub(crate) member: MemberKind,
}

impl DependencyInfo {
    #[inline]
    #[must_use]
    pub fn new(kind: DependencyKind, requested: ExportKey) -> Self {
        Self {
            kind,
            requested,
            name: None,
            key: None,
            optional: matches!(kind, DependencyKind::Optional),
            default: None,
            attributes: Attributes::new(),
            member: MemberKind::Constructor(0),
        }
    }

    /// Parameter or member name, used by name conditions and to match extra data by name.
    #[inline]
    #[must_use]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Requests an export name instead of the parameter type.
    #[inline]
    #[must_use]
    pub fn locate_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.requested = ExportKey::Name(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_key(mut self, key: impl Into<LocateKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value used when nothing can be located.
    #[inline]
    #[must_use]
    pub fn with_default<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_default_instance(Instance::from_value(value))
    }

    #[inline]
    #[must_use]
    pub fn with_default_instance(mut self, value: Instance) -> Self {
        self.default = Some(value);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes = self.attributes.with(attribute);
        self
    }

    #[inline]
    #[must_use]
    pub(crate) const fn at(mut self, member: MemberKind) -> Self {
        self.member = member;
        self
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> DependencyKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn requested(&self) -> &ExportKey {
        &self.requested
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> Option<&LocateKey> {
        self.key.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[inline]
    #[must_use]
    pub const fn member(&self) -> MemberKind {
        self.member
    }

    /// Dependencies filled from the activation itself instead of a locate.
    #[inline]
    #[must_use]
    pub const fn is_located(&self) -> bool {
        !matches!(self.kind, DependencyKind::Decorated | DependencyKind::TypeArgs)
    }

    /// A missing export for this dependency fails the activation.
    #[inline]
    #[must_use]
    pub const fn is_required(&self) -> bool {
        !self.optional && self.default.is_none() && matches!(self.kind, DependencyKind::Single | DependencyKind::Meta)
    }
}

impl Debug for DependencyInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyInfo")
            .field("kind", &self.kind)
            .field("requested", &self.requested)
            .field("name", &self.name)
            .field("key", &self.key)
            .field("optional", &self.optional)
            .field("has_default", &self.default.is_some())
            .field("member", &self.member)
            .finish()
    }
}
