use alloc::{
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};

use crate::{strategy::ExportKey, types::TypeRef};

#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigurationErrorKind {
    #[error("No constructor registered for {activation_type}")]
    NoConstructor { activation_type: TypeRef },
    #[error(
        "No constructor of {activation_type} has a resolvable parameter set. Missing: {}",
        join_keys(.missing)
    )]
    NoResolvableConstructor { activation_type: TypeRef, missing: Vec<ExportKey> },
    #[error("Open generic {activation_type} can't be activated without closing it first")]
    OpenActivation { activation_type: TypeRef },
    #[error("Generic {name} expects {expected} type arguments, got {actual}")]
    TypeArity { name: &'static str, expected: usize, actual: usize },
    #[error("Named scope `{name}` not found in the scope chain")]
    NamedScopeMissing { name: Arc<str> },
    #[error("Lifestyle `{lifestyle}` couldn't compute a key for {activation_type}")]
    LifestyleKeyMissing { lifestyle: &'static str, activation_type: TypeRef },
    #[error("Ancestor {ancestor} not found in the resolution chain of {activation_type}")]
    AncestorMissing { ancestor: TypeRef, activation_type: TypeRef },
    #[error("Export {export} of {activation_type} is not backed by a compatible value")]
    InvalidCast { export: TypeRef, activation_type: TypeRef },
    #[error("Invalid registration: {0}")]
    Invalid(String),
}

fn join_keys(keys: &[ExportKey]) -> String {
    keys.iter().map(|key| key.to_string()).collect::<Vec<_>>().join(", ")
}
