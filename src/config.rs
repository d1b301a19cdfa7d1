use crate::strategy::{ConstructorSelection, ExportEnvironment};

pub(crate) const DEFAULT_MAX_RESOLVE_DEPTH: u16 = 100;
pub(crate) const DEFAULT_TRAIL_CAPACITY: usize = 10;

/// Config for a container
/// ## Fields
/// - `max_resolve_depth`:
///   Nesting limit of one resolution. Exceeding it is reported as a circular dependency.
/// - `trail_capacity`:
///   How many "what was being resolved for what" entries a [`crate::LocateError`] keeps.
///   Older entries are dropped and counted.
/// - `constructor_selection`:
///   Policy for strategies with several constructors that don't set their own.
/// - `prefer_open_generics`:
///   If `true`, the least closed generic candidate wins a tie instead of the most closed one.
/// - `environment`:
///   Strategies restricted to other environments are invisible to this container.
/// - `track_disposable_transients`:
///   If `false`, transient instances with a finalizer are not tracked by any disposal scope.
/// - `auto_register_wrappers`:
///   Enables built-in fallbacks for `Lazy`, `Factory`, `KeyedFactory`, `All`, `Optional` and `Meta` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    pub max_resolve_depth: u16,
    pub trail_capacity: usize,
    pub constructor_selection: ConstructorSelection,
    pub prefer_open_generics: bool,
    pub environment: ExportEnvironment,
    pub track_disposable_transients: bool,
    pub auto_register_wrappers: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            constructor_selection: ConstructorSelection::BestMatch,
            prefer_open_generics: false,
            environment: ExportEnvironment::RUN_TIME,
            track_disposable_transients: true,
            auto_register_wrappers: true,
        }
    }
}

impl ContainerConfig {
    #[inline]
    #[must_use]
    pub const fn with_max_resolve_depth(mut self, max_resolve_depth: u16) -> Self {
        self.max_resolve_depth = max_resolve_depth;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_trail_capacity(mut self, trail_capacity: usize) -> Self {
        self.trail_capacity = trail_capacity;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_constructor_selection(mut self, constructor_selection: ConstructorSelection) -> Self {
        self.constructor_selection = constructor_selection;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_prefer_open_generics(mut self, prefer_open_generics: bool) -> Self {
        self.prefer_open_generics = prefer_open_generics;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_environment(mut self, environment: ExportEnvironment) -> Self {
        self.environment = environment;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_track_disposable_transients(mut self, track: bool) -> Self {
        self.track_disposable_transients = track;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_auto_register_wrappers(mut self, enabled: bool) -> Self {
        self.auto_register_wrappers = enabled;
        self
    }
}
