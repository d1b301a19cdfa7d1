use alloc::vec::Vec;

use super::{Constraint, TypeRef, TypeRegistry};

/// Result of closing an open strategy for a concrete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenericMatch {
    /// Activation type with every parameter substituted.
    pub(crate) closed: TypeRef,
    /// Concrete leaves of the export pattern that matched, see [`TypeRef::specificity`].
    pub(crate) specificity: usize,
}

/// Closes `activation` (e.g. `Partial<T0, T1>`) for `requested` through one of its export patterns
/// (e.g. `Base<T0, T1, f64, String>`).
///
/// The pattern binds the parameters, every activation parameter must end up bound,
/// and every bound argument has to satisfy its constraints.
pub(crate) fn close(
    registry: &TypeRegistry,
    activation: &TypeRef,
    pattern: &TypeRef,
    requested: &TypeRef,
    constraints: &[(u8, Constraint)],
) -> Option<GenericMatch> {
    let mut bindings = Vec::new();
    if !pattern.unify(requested, &mut bindings) {
        return None;
    }

    let arity = activation.param_count();
    if bindings.len() < arity {
        bindings.resize(arity, None);
    }
    let args = bindings.iter().cloned().collect::<Option<Vec<_>>>()?;

    let def_constraints = registry
        .generic_params(activation)
        .into_iter()
        .enumerate()
        .filter_map(|(index, param)| u8::try_from(index).ok().map(|index| (index, param.constraint)));
    let satisfied = def_constraints
        .chain(constraints.iter().cloned())
        .all(|(index, constraint)| match args.get(usize::from(index)) {
            Some(arg) => registry.satisfies(arg, &constraint, &args),
            None => true,
        });
    if !satisfied {
        return None;
    }

    Some(GenericMatch {
        closed: activation.substitute(&bindings)?,
        specificity: pattern.specificity(),
    })
}

#[cfg(test)]
mod tests {
    use super::close;
    use crate::types::{Constraint, GenericDef, TypeDescriptor, TypeRef, TypeRegistry};

    use alloc::string::String;

    struct Basic;

    #[test]
    fn test_close_partially_closed_export() {
        let registry = TypeRegistry::new();
        let base = GenericDef::new("Base", 4);
        let partial = GenericDef::new("Partial", 2);

        let pattern = base
            .of([TypeRef::param(0), TypeRef::param(1), TypeRef::of::<f64>(), TypeRef::of::<String>()])
            .unwrap();
        let requested = base
            .of([TypeRef::of::<u8>(), TypeRef::of::<Basic>(), TypeRef::of::<f64>(), TypeRef::of::<String>()])
            .unwrap();
        let other = base
            .of([TypeRef::of::<u8>(), TypeRef::of::<Basic>(), TypeRef::of::<f32>(), TypeRef::of::<String>()])
            .unwrap();

        let matched = close(&registry, &partial.open(), &pattern, &requested, &[]).unwrap();
        assert_eq!(matched.closed, partial.of([TypeRef::of::<u8>(), TypeRef::of::<Basic>()]).unwrap());
        assert_eq!(matched.specificity, 2);
        assert!(close(&registry, &partial.open(), &pattern, &other, &[]).is_none());
    }

    #[test]
    fn test_close_checks_constraints() {
        let registry = TypeRegistry::new();
        let list = GenericDef::new("List", 1);
        let values = GenericDef::new("Values", 1);
        registry.describe(&values.open(), TypeDescriptor::class().with_param("T", Constraint::ValueType));

        let of = |ty: TypeRef| list.of([ty]).unwrap();

        assert!(close(&registry, &values.open(), &list.open(), &of(TypeRef::of::<u8>()), &[]).is_some());
        assert!(close(&registry, &values.open(), &list.open(), &of(TypeRef::of::<Basic>()), &[]).is_none());

        let only_u16 = [(0, Constraint::equals(TypeRef::of::<u16>()))];
        assert!(close(&registry, &values.open(), &list.open(), &of(TypeRef::of::<u8>()), &only_u16).is_none());
        assert!(close(&registry, &values.open(), &list.open(), &of(TypeRef::of::<u16>()), &only_u16).is_some());
    }

    #[test]
    fn test_close_requires_all_params_bound() {
        let registry = TypeRegistry::new();
        let pair = GenericDef::new("Pair", 2);
        let single = GenericDef::new("Single", 1);

        let requested = single.of([TypeRef::of::<u8>()]).unwrap();
        assert!(close(&registry, &pair.open(), &single.open(), &requested, &[]).is_none());
    }
}
