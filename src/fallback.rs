//! What a locate falls back to when no strategy matches.
//!
//! In order: built-in wrappers of the requested type (`Lazy<T>`, `Factory<T>`,
//! `KeyedFactory<T>`, `All<T>`, `Optional<T>`, `Meta<T>`), secondary locators, and
//! providers that register a strategy for the missing export on the fly.

mod secondary;
mod wrappers;

use alloc::vec::Vec;

pub use secondary::{LocateRequestInfo, MissingExportStrategyProvider, SecondaryLocator};
pub use wrappers::{DeferredLocate, Factory, FactoryInstance, KeyedFactory, KeyedFactoryInstance, Lazy, LazyInstance, Meta, MetaInstance};

use crate::{
    any::Instance,
    container::Container,
    context::InjectionContext,
    errors::LocateError,
    resolve::{LocateRequest, Located},
    strategy::ExportKey,
    types::{
        well_known::{is_wrapper, ALL, FACTORY, KEYED_FACTORY, LAZY, META, OPTIONAL},
        TypeRef,
    },
};

/// Resolves a request for one of the built-in wrapper definitions.
///
/// Returns `None` if the request isn't a wrapper or, for `Meta<T>`, if nothing is exported as `T`.
pub(crate) fn locate_wrapper(
    scope: &Container,
    request: &LocateRequest<'_>,
    context: &mut InjectionContext,
) -> Result<Option<Located>, LocateError> {
    let Some(TypeRef::Generic(def, args)) = request.requested.as_type() else {
        return Ok(None);
    };
    let def = *def;
    let [inner] = &**args else {
        return Ok(None);
    };
    if !is_wrapper(def) {
        return Ok(None);
    }

    let inner = ExportKey::Type(inner.clone());
    let inner_request = LocateRequest {
        requested: &inner,
        key: request.key,
        site: request.site,
        filter: request.filter,
    };
    let extra = context.extra().clone();
    let deferred = || DeferredLocate::new(scope, inner.clone(), request.key.cloned(), extra.clone());

    let instance = if def == LAZY {
        Instance::from_value(LazyInstance::new(deferred()))
    } else if def == FACTORY {
        Instance::from_value(FactoryInstance::new(deferred()))
    } else if def == KEYED_FACTORY {
        Instance::from_value(KeyedFactoryInstance::new(deferred()))
    } else if def == ALL {
        let located = scope.resolve_all(&inner_request, context)?;
        Instance::from_value(located.into_iter().map(|located| located.instance).collect::<Vec<_>>())
    } else if def == OPTIONAL {
        Instance::from_value(scope.resolve(&inner_request, context)?.map(|located| located.instance))
    } else if def == META {
        let Some(Located { instance, strategy }) = scope.resolve(&inner_request, context)? else {
            return Ok(None);
        };
        let metadata = strategy.map(|strategy| strategy.metadata().clone()).unwrap_or_default();
        Instance::from_value(MetaInstance::new(instance, metadata))
    } else {
        return Ok(None);
    };

    Ok(Some(Located { instance, strategy: None }))
}
