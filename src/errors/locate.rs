use alloc::sync::Arc;
use core::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use super::{ConfigurationErrorKind, DisposalErrorKind, InstantiateErrorKind, LocationTrail, TrailEntry};
use crate::{strategy::ExportKey, types::TypeRef};

#[derive(thiserror::Error, Debug)]
pub enum LocateErrorKind {
    #[error("Can't locate export {requested}")]
    CannotLocateExport { requested: ExportKey },
    #[error("Missing dependency {dependency} of {target}")]
    MissingDependency { dependency: ExportKey, target: TypeRef },
    #[error("Circular dependency suspected: resolve depth exceeded {max_depth}")]
    CircularDependency { max_depth: u16 },
    #[error("No disposal scope available to track disposable {activation_type}")]
    DisposalScopeMissing { activation_type: TypeRef },
    #[error("Disposal scope rejected {activation_type}: {source}")]
    DisposalScopeClosed {
        activation_type: TypeRef,
        #[source]
        source: DisposalErrorKind,
    },
    #[error("Incorrect value type. Expected: {expected}, actual: {actual}")]
    IncorrectType { expected: &'static str, actual: &'static str },
    #[error("Scope {} is closed", .scope.as_deref().unwrap_or("<unnamed>"))]
    ScopeClosed { scope: Option<Arc<str>> },
    #[error("Container behind a deferred locate of {requested} was dropped")]
    ContainerDropped { requested: ExportKey },
    #[error(transparent)]
    Configuration(#[from] ConfigurationErrorKind),
    #[error("Activation of {activation_type} failed: {source}")]
    Activation {
        activation_type: TypeRef,
        #[source]
        source: InstantiateErrorKind,
    },
}

/// Failure of a locate call together with the accumulated resolution trail.
#[derive(Debug)]
pub struct LocateError {
    pub kind: LocateErrorKind,
    pub trail: LocationTrail,
}

impl LocateError {
    #[inline]
    #[must_use]
    pub fn new(kind: LocateErrorKind, trail_capacity: usize) -> Self {
        Self {
            kind,
            trail: LocationTrail::new(trail_capacity),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_entry(mut self, entry: TrailEntry) -> Self {
        self.trail.push(entry);
        self
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &LocateErrorKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, LocateErrorKind::CannotLocateExport { .. })
    }

    #[inline]
    #[must_use]
    pub fn is_circular(&self) -> bool {
        matches!(self.kind, LocateErrorKind::CircularDependency { .. })
    }
}

impl Display for LocateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.trail)
    }
}

impl Error for LocateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<LocateErrorKind> for LocateError {
    #[inline]
    fn from(kind: LocateErrorKind) -> Self {
        Self::new(kind, crate::config::DEFAULT_TRAIL_CAPACITY)
    }
}
