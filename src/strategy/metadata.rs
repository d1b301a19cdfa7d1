use alloc::{string::String, sync::Arc};
use core::fmt::{self, Display, Formatter};

use crate::{immutable::ImmutableTree, types::TypeRef};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MetadataValue {
    Str(Arc<str>),
    Int(i64),
    Bool(bool),
    Type(TypeRef),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<TypeRef> for MetadataValue {
    fn from(value: TypeRef) -> Self {
        Self::Type(value)
    }
}

impl Display for MetadataValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Type(value) => write!(f, "{value}"),
        }
    }
}

/// Key/value data attached to a strategy, visible through `Meta<T>` and export filters.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: ImmutableTree<Arc<str>, MetadataValue>,
}

impl Metadata {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with(&self, key: impl Into<Arc<str>>, value: impl Into<MetadataValue>) -> Self {
        Self {
            entries: self.entries.insert_or_update(key.into(), value.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, key: &str, value: &MetadataValue) -> bool {
        self.get(key) == Some(value)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(key, value)| (&**key, value))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
