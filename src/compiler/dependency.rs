use alloc::{sync::Arc, vec::Vec};
use core::fmt::{self, Debug, Formatter};

use crate::{
    any::Instance,
    context::{InjectionContext, InjectionSite},
    dependency_resolver::Resolved,
    errors::{LocateError, LocateErrorKind, TrailEntry},
    fallback::DeferredLocate,
    resolve::{LocateRequest, Located},
    strategy::{DependencyInfo, DependencyKind, ExportKey, Metadata},
    types::{TypeRef, TypeRegistry},
};

/// Compiled resolution of one declared dependency.
pub(crate) struct DependencyFn {
    info: DependencyInfo,
    site: Arc<InjectionSite>,
    target: TypeRef,
}

impl DependencyFn {
    #[must_use]
    pub(crate) fn new(info: DependencyInfo, target: &TypeRef, types: &TypeRegistry) -> Self {
        let mut site = InjectionSite::new(target.clone(), info.member());
        site.member_name.clone_from(&info.name);
        site.member_attributes = info.attributes().clone();
        site.class_attributes = types.attributes(target);
        if let ExportKey::Type(requested) = info.requested() {
            site.target_attributes = types.attributes(requested);
        }

        Self {
            info,
            site: Arc::new(site),
            target: target.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn info(&self) -> &DependencyInfo {
        &self.info
    }

    fn entry(&self, context: &InjectionContext) -> TrailEntry {
        TrailEntry {
            requested: self.info.requested.clone(),
            target: Some(self.target.clone()),
            depth: context.depth(),
        }
    }

    fn missing(&self, context: &InjectionContext) -> LocateError {
        context
            .error(LocateErrorKind::MissingDependency {
                dependency: self.info.requested.clone(),
                target: self.target.clone(),
            })
            .with_entry(self.entry(context))
    }

    fn from_extra(&self, context: &InjectionContext) -> Option<Instance> {
        let extra = context.extra();
        if let Some(value) = self.info.name().and_then(|name| extra.by_name(name)) {
            return Some(value.clone());
        }
        self.info.requested().as_type().and_then(|ty| extra.by_type(ty)).cloned()
    }

    fn locate(&self, context: &InjectionContext) -> Result<Option<Located>, LocateError> {
        if let Some(instance) = self.from_extra(context) {
            return Ok(Some(Located { instance, strategy: None }));
        }

        let request = LocateRequest {
            requested: &self.info.requested,
            key: self.info.key(),
            site: Some(&self.site),
            filter: None,
        };
        let scope = context.requesting().clone();
        scope
            .resolve(&request, &mut context.for_dependency())
            .map_err(|err| err.with_entry(self.entry(context)))
    }

    /// Resolves the dependency for the activation running in `context`.
    ///
    /// # Errors
    /// Returns [`LocateErrorKind::MissingDependency`] for a required dependency nothing is exported for,
    /// or the error of the nested activation.
    pub(crate) fn resolve(&self, context: &InjectionContext) -> Result<Resolved, LocateError> {
        match self.info.kind() {
            DependencyKind::Single | DependencyKind::Optional | DependencyKind::Meta => {
                let meta = self.info.kind() == DependencyKind::Meta;
                match self.locate(context)? {
                    Some(Located { instance, strategy }) if meta => {
                        let metadata = strategy.map(|strategy| strategy.metadata().clone()).unwrap_or_default();
                        Ok(Resolved::WithMeta(instance, metadata))
                    }
                    Some(Located { instance, .. }) => Ok(Resolved::One(Some(instance))),
                    None => match &self.info.default {
                        Some(default) if meta => Ok(Resolved::WithMeta(default.clone(), Metadata::new())),
                        Some(default) => Ok(Resolved::One(Some(default.clone()))),
                        None if self.info.optional => Ok(Resolved::One(None)),
                        None => Err(self.missing(context)),
                    },
                }
            }
            DependencyKind::All => {
                let request = LocateRequest {
                    requested: &self.info.requested,
                    key: self.info.key(),
                    site: Some(&self.site),
                    filter: None,
                };
                let scope = context.requesting().clone();
                let located = scope
                    .resolve_all(&request, &mut context.for_dependency())
                    .map_err(|err| err.with_entry(self.entry(context)))?;
                Ok(Resolved::Many(located.into_iter().map(|located| located.instance).collect::<Vec<_>>()))
            }
            DependencyKind::Lazy | DependencyKind::Factory | DependencyKind::KeyedFactory => Ok(Resolved::Deferred(DeferredLocate::new(
                context.requesting(),
                self.info.requested.clone(),
                self.info.key.clone(),
                context.extra().clone(),
            ))),
            DependencyKind::Decorated => match &context.decorated {
                Some(instance) => Ok(Resolved::One(Some(instance.clone()))),
                None => Err(self.missing(context)),
            },
            DependencyKind::TypeArgs => Ok(Resolved::Types(self.target.args().into())),
        }
    }
}

impl Debug for DependencyFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyFn")
            .field("info", &self.info)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
