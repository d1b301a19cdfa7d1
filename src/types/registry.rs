use alloc::{string::String, vec::Vec};
use tracing::debug;

use super::{Attributes, Constraint, GenericDef, GenericParam, TypeDescriptor, TypeHead, TypeRef};
use crate::immutable::SharedTree;

/// Bases are followed at most this deep, descriptors are user input and may form a cycle.
const MAX_BASE_DEPTH: u8 = 32;

/// Persistent map of [`TypeDescriptor`]s answering type-relationship queries.
pub struct TypeRegistry {
    descriptors: SharedTree<TypeHead, TypeDescriptor>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! describe_value_types {
    ($registry:ident, [$($ty:ty),* $(,)?]) => {
        $(
            $registry.describe(&TypeRef::of::<$ty>(), TypeDescriptor::structure().with_default_constructor());
        )*
    };
}

impl TypeRegistry {
    /// Creates a registry with primitives described as value types with default constructors.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            descriptors: SharedTree::new(),
        };
        describe_value_types!(registry, [bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, ()]);
        registry.describe(&TypeRef::of::<String>(), TypeDescriptor::class().with_default_constructor());
        registry
    }

    /// Registers or extends the descriptor of `ty`'s head.
    pub fn describe(&self, ty: &TypeRef, descriptor: TypeDescriptor) {
        let Some(head) = ty.head() else {
            return;
        };
        self.descriptors
            .thread_safe_merge(head, descriptor, |current, newer| current.merge(newer));
    }

    #[inline]
    pub fn describe_type<T: ?Sized + 'static>(&self, descriptor: TypeDescriptor) {
        self.describe(&TypeRef::of::<T>(), descriptor);
    }

    /// Declares a generic definition with one parameter per entry of `descriptor.params`.
    pub fn define_generic(&self, name: &'static str, descriptor: TypeDescriptor) -> GenericDef {
        let arity = u8::try_from(descriptor.params.len()).unwrap_or(u8::MAX);
        let def = GenericDef::new(name, arity);
        self.describe(&def.open(), descriptor);
        def
    }

    /// Records that `ty` can be used as `base`.
    ///
    /// Only plain types and fully open definitions (`Def<T0, T1, ..>`) carry bases,
    /// a base of one particular closing would leak into every other closing.
    ///
    /// The registry is shared by a whole scope tree, so a base recorded while configuring a
    /// child scope is seen from its parent too.
    pub fn add_base(&self, ty: &TypeRef, base: TypeRef) {
        if *ty == base {
            return;
        }
        let canonical = match ty {
            TypeRef::Type(_) => true,
            TypeRef::Generic(def, _) => *ty == def.open(),
            TypeRef::Param(_) => false,
        };
        if !canonical {
            return;
        }

        debug!(%ty, %base, "Base recorded");
        self.describe(ty, TypeDescriptor::class().with_base(base));
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self, ty: &TypeRef) -> Option<TypeDescriptor> {
        self.descriptors.get(&ty.head()?)
    }

    #[must_use]
    pub fn generic_params(&self, ty: &TypeRef) -> Vec<GenericParam> {
        self.descriptor(ty).map(|descriptor| descriptor.params).unwrap_or_default()
    }

    #[must_use]
    pub fn attributes(&self, ty: &TypeRef) -> Attributes {
        self.descriptor(ty).map(|descriptor| descriptor.attributes).unwrap_or_default()
    }

    /// Undescribed types are treated as reference types.
    #[must_use]
    pub fn is_reference_type(&self, ty: &TypeRef) -> bool {
        self.descriptor(ty).map_or(true, |descriptor| descriptor.is_reference_type())
    }

    #[must_use]
    pub fn has_default_constructor(&self, ty: &TypeRef) -> bool {
        self.descriptor(ty).is_some_and(|descriptor| descriptor.default_constructor)
    }

    /// Returns `true` if a value of `from` can be used where `to` is expected.
    ///
    /// Follows recorded bases, closing the bases of generic definitions with `from`'s arguments.
    /// Generic arguments are invariant.
    #[must_use]
    pub fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        self.is_assignable_within(from, to, MAX_BASE_DEPTH)
    }

    fn is_assignable_within(&self, from: &TypeRef, to: &TypeRef, depth: u8) -> bool {
        if from == to {
            return true;
        }
        if depth == 0 {
            return false;
        }
        let Some(descriptor) = self.descriptor(from) else {
            return false;
        };
        descriptor
            .bases
            .iter()
            .map(|base| base.substitute_args(from.args()))
            .any(|base| self.is_assignable_within(&base, to, depth - 1))
    }

    /// Evaluates `constraint` for `arg`, substituting `bindings` into type references of the constraint.
    #[must_use]
    pub fn satisfies(&self, arg: &TypeRef, constraint: &Constraint, bindings: &[TypeRef]) -> bool {
        match constraint {
            Constraint::None => true,
            Constraint::ReferenceType => self.is_reference_type(arg),
            Constraint::ValueType => !self.is_reference_type(arg),
            Constraint::DefaultConstructor => self.has_default_constructor(arg),
            Constraint::AssignableTo(target) => self.is_assignable(arg, &target.substitute_args(bindings)),
            Constraint::Equals(target) => *arg == target.substitute_args(bindings),
            Constraint::All(items) => items.iter().all(|item| self.satisfies(arg, item, bindings)),
            Constraint::Any(items) => items.iter().any(|item| self.satisfies(arg, item, bindings)),
            Constraint::Not(inner) => !self.satisfies(arg, inner, bindings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeRegistry;
    use crate::types::{Constraint, GenericDef, TypeDescriptor, TypeRef};

    use alloc::string::String;

    struct Basic;
    trait Service {}

    #[test]
    fn test_primitives_are_value_types() {
        let registry = TypeRegistry::new();

        assert!(registry.satisfies(&TypeRef::of::<u8>(), &Constraint::ValueType, &[]));
        assert!(registry.satisfies(&TypeRef::of::<u8>(), &Constraint::DefaultConstructor, &[]));
        assert!(registry.satisfies(&TypeRef::of::<String>(), &Constraint::ReferenceType, &[]));
        assert!(registry.satisfies(&TypeRef::of::<Basic>(), &Constraint::ReferenceType, &[]));
        assert!(!registry.satisfies(&TypeRef::of::<Basic>(), &Constraint::DefaultConstructor, &[]));
    }

    #[test]
    fn test_assignable_through_generic_bases() {
        let registry = TypeRegistry::new();
        let reader = GenericDef::new("Reader", 1);
        let repository = GenericDef::new("Repository", 1);

        registry.add_base(&repository.open(), reader.open());
        registry.add_base(&TypeRef::of::<Basic>(), TypeRef::of::<dyn Service>());

        let closed = repository.of([TypeRef::of::<u8>()]).unwrap();
        assert!(registry.is_assignable(&closed, &reader.of([TypeRef::of::<u8>()]).unwrap()));
        assert!(!registry.is_assignable(&closed, &reader.of([TypeRef::of::<u16>()]).unwrap()));
        assert!(registry.is_assignable(&TypeRef::of::<Basic>(), &TypeRef::of::<dyn Service>()));

        // A base of one closing is not recorded for the definition
        registry.add_base(&closed, TypeRef::of::<dyn Service>());
        assert!(!registry.is_assignable(&closed, &TypeRef::of::<dyn Service>()));
    }

    #[test]
    fn test_open_constraint_is_substituted() {
        let registry = TypeRegistry::new();
        let handler = GenericDef::new("Handler", 1);
        registry.describe(&TypeRef::of::<Basic>(), TypeDescriptor::class().with_base(handler.of([TypeRef::of::<u8>()]).unwrap()));

        let constraint = Constraint::assignable_to(handler.of([TypeRef::param(1)]).unwrap());
        let bindings = [TypeRef::of::<Basic>(), TypeRef::of::<u8>()];

        assert!(registry.satisfies(&TypeRef::of::<Basic>(), &constraint, &bindings));
        assert!(!registry.satisfies(&TypeRef::of::<Basic>(), &constraint, &[TypeRef::of::<Basic>(), TypeRef::of::<u16>()]));
        assert!(registry.satisfies(&TypeRef::of::<Basic>(), &constraint.clone().negate().negate(), &bindings));
    }

    #[test]
    fn test_unset_constraint_combines_as_identity() {
        let registry = TypeRegistry::new();

        let either = Constraint::None.or(Constraint::ValueType);
        assert_eq!(either, Constraint::ValueType);
        assert!(registry.satisfies(&TypeRef::of::<u8>(), &either, &[]));
        assert!(!registry.satisfies(&TypeRef::of::<Basic>(), &either, &[]));
        assert!(!registry.satisfies(&TypeRef::of::<Basic>(), &Constraint::ValueType.or(Constraint::None), &[]));

        let both = Constraint::None.and(Constraint::ReferenceType);
        assert!(registry.satisfies(&TypeRef::of::<Basic>(), &both, &[]));
        assert!(!registry.satisfies(&TypeRef::of::<u8>(), &both, &[]));
    }

    #[test]
    fn test_define_generic() {
        let registry = TypeRegistry::new();
        let def = registry.define_generic(
            "Handler",
            TypeDescriptor::class().with_param("TMessage", Constraint::ReferenceType),
        );

        assert_eq!(def.arity(), 1);
        assert_eq!(registry.generic_params(&def.of([TypeRef::of::<u8>()]).unwrap()).len(), 1);
    }
}
