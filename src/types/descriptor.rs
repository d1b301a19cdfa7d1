use alloc::vec::Vec;

use super::{Attribute, Attributes, Constraint, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    pub name: &'static str,
    pub constraint: Constraint,
}

impl GenericParam {
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, constraint: Constraint) -> Self {
        Self { name, constraint }
    }
}

/// What the container knows about a type or a generic definition.
///
/// Bases of a generic definition may mention its parameters: a descriptor of
/// `Repository<T0>` with base `Reader<T0>` makes `Repository<u8>` assignable to `Reader<u8>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub default_constructor: bool,
    pub bases: Vec<TypeRef>,
    pub params: Vec<GenericParam>,
    pub attributes: Attributes,
}

impl TypeDescriptor {
    #[inline]
    #[must_use]
    pub fn class() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn structure() -> Self {
        Self {
            kind: TypeKind::Struct,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn interface() -> Self {
        Self {
            kind: TypeKind::Interface,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_default_constructor(mut self) -> Self {
        self.default_constructor = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.add_base(base);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_param(mut self, name: &'static str, constraint: Constraint) -> Self {
        self.params.push(GenericParam::new(name, constraint));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes = self.attributes.with(attribute);
        self
    }

    #[inline]
    pub(crate) fn add_base(&mut self, base: TypeRef) {
        if !self.bases.contains(&base) {
            self.bases.push(base);
        }
    }

    /// Combines knowledge from two registrations of the same type.
    ///
    /// The newer kind, flags and params win when they are set, bases and attributes accumulate.
    #[must_use]
    pub(crate) fn merge(&self, newer: TypeDescriptor) -> TypeDescriptor {
        let mut merged = self.clone();
        if newer.kind != TypeKind::Class {
            merged.kind = newer.kind;
        }
        merged.default_constructor |= newer.default_constructor;
        for base in newer.bases {
            merged.add_base(base);
        }
        if !newer.params.is_empty() {
            merged.params = newer.params;
        }
        merged.attributes = merged.attributes.merged(&newer.attributes);
        merged
    }

    #[inline]
    #[must_use]
    pub const fn is_reference_type(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::Interface)
    }
}
