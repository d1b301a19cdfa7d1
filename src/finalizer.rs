use alloc::sync::Arc;
use core::any::type_name;

use crate::{
    any::RcAny,
    service::{service_fn, BoxCloneService},
};

/// Cleanup run when the disposal scope tracking an instance is disposed.
pub trait Finalizer<Dep>: Clone + Send + Sync + 'static {
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error>;
}

/// Value a finalizer closure may return.
pub trait FinalizeOutput {
    fn into_result(self) -> Result<(), anyhow::Error>;
}

impl FinalizeOutput for () {
    #[inline]
    fn into_result(self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

impl<E: Into<anyhow::Error>> FinalizeOutput for Result<(), E> {
    #[inline]
    fn into_result(self) -> Result<(), anyhow::Error> {
        self.map_err(Into::into)
    }
}

impl<F, Dep, Out> Finalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Out + Clone + Send + Sync + 'static,
    Out: FinalizeOutput,
{
    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error> {
        self(dependency).into_result()
    }
}

/// Disposal capability of a value, see [`crate::ExportBuilder::disposable`].
pub trait Disposable: Send + Sync {
    fn dispose(&self) -> Result<(), anyhow::Error>;
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<RcAny, (), anyhow::Error>;

#[must_use]
pub(crate) fn boxed_finalizer_factory<Dep, Fin>(mut finalizer: Fin) -> BoxedCloneFinalizer
where
    Dep: Send + Sync + 'static,
    Fin: Finalizer<Dep>,
{
    BoxCloneService::new(service_fn(move |dependency: RcAny| match dependency.downcast::<Dep>() {
        Ok(dependency) => finalizer.finalize(dependency),
        Err(_) => Err(anyhow::anyhow!("Tracked value is not a {}", type_name::<Dep>())),
    }))
}

#[must_use]
pub(crate) fn disposable_finalizer<Dep: Disposable + 'static>() -> BoxedCloneFinalizer {
    boxed_finalizer_factory(|dependency: Arc<Dep>| dependency.dispose())
}
