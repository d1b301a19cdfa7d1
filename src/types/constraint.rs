use alloc::{boxed::Box, vec::Vec};

use super::TypeRef;

/// Constraint expression on a generic parameter.
///
/// Type references inside a constraint may mention the parameters of the
/// definition being closed; they are substituted before evaluation, so
/// `T0: AssignableTo(Handler<T1>)` is checked against the actual `T1`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Constraint {
    #[default]
    None,
    ReferenceType,
    ValueType,
    DefaultConstructor,
    AssignableTo(TypeRef),
    Equals(TypeRef),
    All(Vec<Constraint>),
    Any(Vec<Constraint>),
    Not(Box<Constraint>),
}

impl Constraint {
    #[inline]
    #[must_use]
    pub fn assignable_to(ty: TypeRef) -> Self {
        Self::AssignableTo(ty)
    }

    #[inline]
    #[must_use]
    pub fn equals(ty: TypeRef) -> Self {
        Self::Equals(ty)
    }

    #[must_use]
    pub fn and(self, other: Constraint) -> Self {
        match (self, other) {
            (Self::None, other) | (other, Self::None) => other,
            (Self::All(mut items), other) => {
                items.push(other);
                Self::All(items)
            }
            (left, right) => Self::All(alloc::vec![left, right]),
        }
    }

    /// `None` stands for "not constrained yet" here as in [`Self::and`], so it yields the other side.
    #[must_use]
    pub fn or(self, other: Constraint) -> Self {
        match (self, other) {
            (Self::None, other) | (other, Self::None) => other,
            (Self::Any(mut items), other) => {
                items.push(other);
                Self::Any(items)
            }
            (left, right) => Self::Any(alloc::vec![left, right]),
        }
    }

    #[inline]
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}
