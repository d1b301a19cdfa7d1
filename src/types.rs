//! Runtime type model.
//!
//! Rust generics are monomorphized, so open generic exports are described with
//! runtime [`GenericDef`]s and matched as [`TypeRef`] trees. The [`TypeRegistry`]
//! holds what the matcher needs to know about each type: its kind, bases and
//! generic parameter constraints.

mod attribute;
mod constraint;
mod descriptor;
pub(crate) mod generic;
mod registry;
mod type_ref;
pub mod well_known;

pub use attribute::{Attribute, Attributes};
pub use constraint::Constraint;
pub use descriptor::{GenericParam, TypeDescriptor, TypeKind};
pub use registry::TypeRegistry;
pub use type_ref::{GenericDef, TypeHead, TypeRef};
