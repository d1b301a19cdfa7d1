//! Generic definitions of the built-in wrapper requests.
//!
//! A request for `LAZY<T>` resolves to a deferred handle of `T`, `ALL<T>` to
//! every export of `T`, and so on. See [`crate::fallback`].

use super::GenericDef;

pub const LAZY: GenericDef = GenericDef::reserved(1, "Lazy", 1);
pub const FACTORY: GenericDef = GenericDef::reserved(2, "Factory", 1);
pub const KEYED_FACTORY: GenericDef = GenericDef::reserved(3, "KeyedFactory", 1);
pub const ALL: GenericDef = GenericDef::reserved(4, "All", 1);
pub const OPTIONAL: GenericDef = GenericDef::reserved(5, "Optional", 1);
pub const META: GenericDef = GenericDef::reserved(6, "Meta", 1);

#[inline]
#[must_use]
pub(crate) fn is_wrapper(def: GenericDef) -> bool {
    [LAZY, FACTORY, KEYED_FACTORY, ALL, OPTIONAL, META].contains(&def)
}
