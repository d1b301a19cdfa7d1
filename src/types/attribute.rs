use alloc::{sync::Arc, vec::Vec};

use crate::strategy::MetadataValue;

/// Static marker attached to a type, a member or an injection target.
///
/// Conditions inspect attributes of the injection site instead of live instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: Arc<str>,
    value: Option<MetadataValue>,
}

impl Attribute {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<MetadataValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> Option<&MetadataValue> {
        self.value.as_ref()
    }
}

impl From<&str> for Attribute {
    #[inline]
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    items: Arc<[Attribute]>,
}

impl Default for Attributes {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Attributes {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }

    #[must_use]
    pub fn with(&self, attribute: impl Into<Attribute>) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(attribute.into());
        Self { items: items.into() }
    }

    #[must_use]
    pub fn merged(&self, other: &Attributes) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        Self {
            items: self.items.iter().chain(other.items.iter()).cloned().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.items.iter().find(|attribute| attribute.name() == name)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
