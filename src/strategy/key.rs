use alloc::{string::String, sync::Arc};
use core::fmt::{self, Debug, Display, Formatter};

use crate::types::{GenericDef, TypeRef};

/// Identity a strategy is exported under and requests are made for.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportKey {
    Type(TypeRef),
    Name(Arc<str>),
}

impl ExportKey {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeRef::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Self::Name(name.into())
    }

    #[inline]
    #[must_use]
    pub const fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Type(ty) => Some(ty),
            Self::Name(_) => None,
        }
    }
}

impl From<TypeRef> for ExportKey {
    #[inline]
    fn from(ty: TypeRef) -> Self {
        Self::Type(ty)
    }
}

impl From<&str> for ExportKey {
    #[inline]
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl Display for ExportKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => Display::fmt(ty, f),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

impl Debug for ExportKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Key of a keyed export, see [`crate::ExportBuilder::with_key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocateKey {
    Str(Arc<str>),
    Int(i64),
    Type(TypeRef),
}

impl From<&str> for LocateKey {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for LocateKey {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<i64> for LocateKey {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LocateKey {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for LocateKey {
    #[inline]
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<TypeRef> for LocateKey {
    #[inline]
    fn from(value: TypeRef) -> Self {
        Self::Type(value)
    }
}

impl Display for LocateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => write!(f, "\"{value}\""),
            Self::Int(value) => write!(f, "{value}"),
            Self::Type(value) => write!(f, "{value}"),
        }
    }
}

/// Key of the scope strategy maps.
///
/// Open generic exports are stored under their definition and closed on request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum StorageKey {
    Export(ExportKey),
    Open(GenericDef),
}

impl StorageKey {
    #[must_use]
    pub(crate) fn for_type(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Generic(def, _) if ty.is_open() => Self::Open(*def),
            _ => Self::Export(ExportKey::Type(ty.clone())),
        }
    }
}
