use alloc::{sync::Arc, vec::Vec};
use core::{
    any::TypeId,
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::atomic::{AtomicU32, Ordering as AtomicOrdering},
};

use crate::{any::TypeInfo, errors::ConfigurationErrorKind};

/// Ids below this value are reserved for the built-in wrapper definitions.
const FIRST_USER_DEF_ID: u32 = 64;

static NEXT_DEF_ID: AtomicU32 = AtomicU32::new(FIRST_USER_DEF_ID);

/// Runtime generic type definition, e.g. `Repository<_>`.
///
/// Definitions are compared by id, so two definitions with the same name are still different types.
#[derive(Clone, Copy)]
pub struct GenericDef {
    id: u32,
    name: &'static str,
    arity: u8,
}

impl GenericDef {
    #[must_use]
    pub fn new(name: &'static str, arity: u8) -> Self {
        Self {
            id: NEXT_DEF_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name,
            arity,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn reserved(id: u32, name: &'static str, arity: u8) -> Self {
        Self { id, name, arity }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn arity(&self) -> u8 {
        self.arity
    }

    /// Closes (or partially closes) the definition with `args`.
    ///
    /// # Errors
    /// Returns [`ConfigurationErrorKind::TypeArity`] if the count of arguments differs from the arity.
    pub fn of(&self, args: impl IntoIterator<Item = TypeRef>) -> Result<TypeRef, ConfigurationErrorKind> {
        let args = args.into_iter().collect::<Vec<_>>();
        if args.len() != usize::from(self.arity) {
            return Err(ConfigurationErrorKind::TypeArity {
                name: self.name,
                expected: usize::from(self.arity),
                actual: args.len(),
            });
        }
        Ok(TypeRef::Generic(*self, args.into()))
    }

    /// The definition with every argument left open: `Def<T0, T1, ..>`.
    #[must_use]
    pub fn open(&self) -> TypeRef {
        TypeRef::Generic(*self, (0..self.arity).map(TypeRef::Param).collect())
    }
}

impl PartialEq for GenericDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GenericDef {}

impl PartialOrd for GenericDef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GenericDef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for GenericDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for GenericDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}`{}", self.name, self.arity)
    }
}

/// Key of a [`crate::TypeDescriptor`]: a plain Rust type or a generic definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeHead {
    Type(TypeId),
    Generic(u32),
}

/// Runtime type reference.
///
/// A reference is *open* when it mentions a generic parameter anywhere.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRef {
    Type(TypeInfo),
    Generic(GenericDef, Arc<[TypeRef]>),
    Param(u8),
}

impl TypeRef {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub const fn param(index: u8) -> Self {
        Self::Param(index)
    }

    #[must_use]
    pub fn head(&self) -> Option<TypeHead> {
        match self {
            Self::Type(info) => Some(TypeHead::Type(info.id)),
            Self::Generic(def, _) => Some(TypeHead::Generic(def.id)),
            Self::Param(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn def(&self) -> Option<GenericDef> {
        match self {
            Self::Generic(def, _) => Some(*def),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Generic(_, args) => args,
            _ => &[],
        }
    }

    #[inline]
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        matches!(self, Self::Type(info) if info.id == TypeId::of::<T>())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            Self::Type(_) => false,
            Self::Generic(_, args) => args.iter().any(Self::is_open),
            Self::Param(_) => true,
        }
    }

    /// Count of concrete leaves, the more the more closed the reference is.
    #[must_use]
    pub fn specificity(&self) -> usize {
        match self {
            Self::Type(_) => 1,
            Self::Generic(_, args) => args.iter().map(Self::specificity).sum(),
            Self::Param(_) => 0,
        }
    }

    /// Highest parameter index mentioned plus one.
    #[must_use]
    pub fn param_count(&self) -> usize {
        match self {
            Self::Type(_) => 0,
            Self::Generic(_, args) => args.iter().map(Self::param_count).max().unwrap_or(0),
            Self::Param(index) => usize::from(*index) + 1,
        }
    }

    /// Replaces parameters with their bindings, `None` if one of them is unbound.
    #[must_use]
    pub fn substitute(&self, bindings: &[Option<TypeRef>]) -> Option<TypeRef> {
        match self {
            Self::Type(_) => Some(self.clone()),
            Self::Generic(def, args) => {
                let args = args.iter().map(|arg| arg.substitute(bindings)).collect::<Option<Arc<[_]>>>()?;
                Some(Self::Generic(*def, args))
            }
            Self::Param(index) => bindings.get(usize::from(*index)).cloned().flatten(),
        }
    }

    /// Replaces parameters that have an argument, keeping the rest open.
    #[must_use]
    pub fn substitute_args(&self, args: &[TypeRef]) -> TypeRef {
        match self {
            Self::Type(_) => self.clone(),
            Self::Generic(def, inner) => Self::Generic(*def, inner.iter().map(|arg| arg.substitute_args(args)).collect()),
            Self::Param(index) => args.get(usize::from(*index)).cloned().unwrap_or_else(|| self.clone()),
        }
    }

    /// Matches `self` as a pattern against `concrete`, binding parameters.
    ///
    /// A parameter bound twice must be bound to equal types.
    pub fn unify(&self, concrete: &TypeRef, bindings: &mut Vec<Option<TypeRef>>) -> bool {
        match (self, concrete) {
            (Self::Param(index), _) => {
                let index = usize::from(*index);
                if bindings.len() <= index {
                    bindings.resize(index + 1, None);
                }
                match &bindings[index] {
                    Some(bound) => bound == concrete,
                    None => {
                        bindings[index] = Some(concrete.clone());
                        true
                    }
                }
            }
            (Self::Type(left), Self::Type(right)) => left == right,
            (Self::Generic(left_def, left_args), Self::Generic(right_def, right_args)) => {
                left_def == right_def
                    && left_args.len() == right_args.len()
                    && left_args.iter().zip(right_args.iter()).all(|(left, right)| left.unify(right, bindings))
            }
            _ => false,
        }
    }
}

impl From<TypeInfo> for TypeRef {
    #[inline]
    fn from(info: TypeInfo) -> Self {
        Self::Type(info)
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(info) => f.write_str(info.short_name()),
            Self::Generic(def, args) => {
                write!(f, "{}<", def.name)?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(arg, f)?;
                }
                f.write_str(">")
            }
            Self::Param(index) => write!(f, "T{index}"),
        }
    }
}

impl Debug for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{GenericDef, TypeRef};
    use crate::errors::ConfigurationErrorKind;

    use alloc::{string::ToString as _, vec::Vec};

    #[test]
    fn test_unify_binds_params() {
        let base = GenericDef::new("Base", 4);
        let pattern = base
            .of([TypeRef::param(0), TypeRef::param(1), TypeRef::of::<f64>(), TypeRef::param(0)])
            .unwrap();
        let concrete = base
            .of([TypeRef::of::<u8>(), TypeRef::of::<u16>(), TypeRef::of::<f64>(), TypeRef::of::<u8>()])
            .unwrap();
        let conflicting = base
            .of([TypeRef::of::<u8>(), TypeRef::of::<u16>(), TypeRef::of::<f64>(), TypeRef::of::<u32>()])
            .unwrap();

        let mut bindings = Vec::new();
        assert!(pattern.unify(&concrete, &mut bindings));
        assert_eq!(bindings, [Some(TypeRef::of::<u8>()), Some(TypeRef::of::<u16>())]);
        assert!(!pattern.unify(&conflicting, &mut Vec::new()));

        assert!(pattern.is_open());
        assert!(!concrete.is_open());
        assert_eq!(pattern.specificity(), 1);
        assert_eq!(pattern.param_count(), 2);
        assert_eq!(pattern.substitute(&bindings), Some(concrete));
    }

    #[test]
    fn test_arity_and_display() {
        let list = GenericDef::new("List", 1);

        assert!(matches!(
            list.of([]),
            Err(ConfigurationErrorKind::TypeArity { expected: 1, actual: 0, .. })
        ));
        assert_eq!(list.of([TypeRef::of::<u8>()]).unwrap().to_string(), "List<u8>");
        assert_eq!(list.open().to_string(), "List<T0>");
        assert_ne!(GenericDef::new("List", 1), list);
    }
}
