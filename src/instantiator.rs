use alloc::boxed::Box;
use core::any::Any;
use tracing::debug;

use crate::{
    dependency_resolver::{ActivationArgs, DependencyResolver},
    errors::{InstantiateErrorKind, InstantiatorErrorKind, LocateErrorKind},
    service::{service_fn, BoxCloneService},
};

/// Constructor of a value from resolved dependencies.
///
/// Implemented for closures taking up to 16 [`DependencyResolver`] arguments.
pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

pub(crate) type BoxedCloneInstantiator =
    BoxCloneService<ActivationArgs, Box<dyn Any + Send + Sync>, InstantiatorErrorKind<LocateErrorKind, InstantiateErrorKind>>;

#[must_use]
pub(crate) fn boxed_instantiator_factory<Inst, Deps>(mut instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver,
{
    BoxCloneService::new(service_fn(move |mut args: ActivationArgs| {
        let dependencies = match Deps::resolve(&mut args) {
            Ok(dependencies) => dependencies,
            Err(err) => return Err(InstantiatorErrorKind::Deps(err.into())),
        };
        let value = match instantiator.instantiate(dependencies) {
            Ok(value) => value,
            Err(err) => return Err(InstantiatorErrorKind::Factory(err.into())),
        };

        debug!("Instantiated");

        Ok(Box::new(value) as _)
    }))
}

/// Instantiator returning a clone of `value` on every activation.
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(value: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> + Send + Sync {
    move || Ok::<_, InstantiateErrorKind>(value.clone())
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            #[inline]
            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{format, string::{String, ToString}};

    use super::{boxed_instantiator_factory, instance, Instantiator};
    use crate::{
        any::Instance,
        dependency_resolver::{ActivationArgs, DependencyResolver, Resolved},
        errors::{InstantiateErrorKind, InstantiatorErrorKind},
        inject::Inject,
        service::Service as _,
        types::TypeRef,
    };

    use alloc::{collections::VecDeque, sync::Arc, vec};
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    struct Request(u8);
    struct Response(u8);

    #[test]
    #[allow(dead_code)]
    fn test_instantiator_impls() {
        fn instantiator<Deps: DependencyResolver, F: Instantiator<Deps>>(_f: F) {}
        fn instantiator_with_dep() {
            instantiator(|| Ok::<_, InstantiateErrorKind>(()));
            instantiator(|Inject(_): Inject<Request>| Ok::<_, InstantiateErrorKind>(()));
            instantiator(instance(1_u8));
        }
    }

    #[test]
    #[traced_test]
    fn test_boxed_instantiator_factory() {
        let call_count = Arc::new(AtomicU8::new(0));
        let mut instantiator = boxed_instantiator_factory({
            let call_count = call_count.clone();
            move |Inject(request): Inject<Request>| {
                call_count.fetch_add(1, Ordering::SeqCst);

                debug!("Call instantiator");
                Ok::<_, InstantiateErrorKind>(Response(request.0 + 1))
            }
        });

        let args = || {
            ActivationArgs::new(
                TypeRef::of::<Response>(),
                VecDeque::from(vec![Resolved::One(Some(Instance::from_value(Request(1))))]),
            )
        };
        let response_1 = instantiator.call(args()).unwrap();
        let response_2 = instantiator.clone().call(args()).unwrap();

        assert_eq!(response_1.downcast::<Response>().unwrap().0, 2);
        assert_eq!(response_2.downcast::<Response>().unwrap().0, 2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert!(logs_contain("Call instantiator"));
    }

    #[test]
    #[traced_test]
    fn test_errors_are_split() {
        let mut failing = boxed_instantiator_factory(|| Err::<Response, _>(InstantiateErrorKind::message("boom")));
        let mut missing = boxed_instantiator_factory(|Inject(_): Inject<Request>| Ok::<_, InstantiateErrorKind>(Response(0)));

        let empty = || ActivationArgs::new(TypeRef::of::<Response>(), VecDeque::new());

        assert!(matches!(failing.call(empty()), Err(InstantiatorErrorKind::Factory(_))));
        assert!(matches!(missing.call(empty()), Err(InstantiatorErrorKind::Deps(_))));
    }
}
