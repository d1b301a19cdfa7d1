use crate::{
    any::Instance,
    configure::RegistrationBlock,
    context::InjectionContext,
    strategy::{ExportKey, LocateKey},
    types::TypeRef,
};

/// The request a fallback is consulted for.
#[derive(Debug, Clone, Copy)]
pub struct LocateRequestInfo<'a> {
    pub(crate) requested: &'a ExportKey,
    pub(crate) key: Option<&'a LocateKey>,
    pub(crate) injected_into: Option<&'a TypeRef>,
}

impl<'a> LocateRequestInfo<'a> {
    #[inline]
    #[must_use]
    pub const fn requested(&self) -> &'a ExportKey {
        self.requested
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> Option<&'a LocateKey> {
        self.key
    }

    /// `None` for top-level locate calls.
    #[inline]
    #[must_use]
    pub const fn injected_into(&self) -> Option<&'a TypeRef> {
        self.injected_into
    }
}

/// Supplies an instance when nothing is registered for a request, e.g. a test double.
///
/// Instances returned by a secondary locator are not tracked for disposal.
pub trait SecondaryLocator: Send + Sync {
    fn locate(&self, request: &LocateRequestInfo<'_>, context: &InjectionContext) -> Option<Instance>;
}

impl<F> SecondaryLocator for F
where
    F: Fn(&LocateRequestInfo<'_>, &InjectionContext) -> Option<Instance> + Send + Sync,
{
    #[inline]
    fn locate(&self, request: &LocateRequestInfo<'_>, context: &InjectionContext) -> Option<Instance> {
        self(request, context)
    }
}

/// Registers strategies for a missing export, the locate is retried once afterwards.
///
/// Strategies added to `block` are committed to the root scope.
pub trait MissingExportStrategyProvider: Send + Sync {
    fn provide(&self, request: &LocateRequestInfo<'_>, block: &mut RegistrationBlock);
}

impl<F> MissingExportStrategyProvider for F
where
    F: Fn(&LocateRequestInfo<'_>, &mut RegistrationBlock) + Send + Sync,
{
    #[inline]
    fn provide(&self, request: &LocateRequestInfo<'_>, block: &mut RegistrationBlock) {
        self(request, block);
    }
}
