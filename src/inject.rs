use alloc::{sync::Arc, vec::Vec};
use core::any::type_name;

use crate::{
    any::Instance,
    dependency_resolver::{ActivationArgs, DependencyResolver, Resolved},
    errors::LocateErrorKind,
    fallback::{Factory, KeyedFactory, Lazy, Meta},
    strategy::{DependencyInfo, DependencyKind, ExportKey},
    types::TypeRef,
};

pub(crate) fn downcast_instance<K: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Result<Arc<K>, LocateErrorKind> {
    instance.downcast::<K>().ok_or_else(|| LocateErrorKind::IncorrectType {
        expected: type_name::<K>(),
        actual: instance.view_type().name,
    })
}

#[inline]
fn declare<K: ?Sized + 'static>(dependencies: &mut Vec<DependencyInfo>, kind: DependencyKind) {
    dependencies.push(DependencyInfo::new(kind, ExportKey::of::<K>()));
}

/// Located instance of `K`.
pub struct Inject<K: ?Sized>(pub Arc<K>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for Inject<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::Single);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::One(Some(instance))) => downcast_instance(&instance).map(Self),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

/// Located instance of `K`, or `None` if nothing is exported as `K`.
pub struct InjectOptional<K: ?Sized>(pub Option<Arc<K>>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for InjectOptional<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::Optional);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::One(Some(instance))) => downcast_instance(&instance).map(|value| Self(Some(value))),
            Some(Resolved::One(None)) => Ok(Self(None)),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

/// Every instance exported as `K`, child scopes first, by priority and then registration order.
pub struct InjectAll<K: ?Sized>(pub Vec<Arc<K>>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for InjectAll<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::All);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::Many(instances)) => instances
                .iter()
                .map(downcast_instance::<K>)
                .collect::<Result<_, _>>()
                .map(Self),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

pub struct InjectLazy<K: ?Sized>(pub Lazy<K>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for InjectLazy<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::Lazy);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::Deferred(deferred)) => Ok(Self(Lazy::new(deferred))),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

pub struct InjectFactory<K: ?Sized>(pub Factory<K>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for InjectFactory<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::Factory);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::Deferred(deferred)) => Ok(Self(Factory::new(deferred))),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

pub struct InjectKeyedFactory<K: ?Sized>(pub KeyedFactory<K>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for InjectKeyedFactory<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::KeyedFactory);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::Deferred(deferred)) => Ok(Self(KeyedFactory::new(deferred))),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

/// Located instance of `K` with the metadata of the strategy that produced it.
pub struct InjectMeta<K: ?Sized>(pub Meta<K>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for InjectMeta<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::Meta);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::WithMeta(instance, metadata)) => {
                downcast_instance(&instance).map(|value| Self(Meta::new(value, metadata)))
            }
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

/// Instance a decorator wraps.
pub struct Decorated<K: ?Sized>(pub Arc<K>);

impl<K: ?Sized + Send + Sync + 'static> DependencyResolver for Decorated<K> {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<K>(dependencies, DependencyKind::Decorated);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::One(Some(instance))) => downcast_instance(&instance).map(Self),
            _ => Err(args.missing(ExportKey::of::<K>())),
        }
    }
}

/// Type arguments of the closed type being activated, empty for non-generic types.
pub struct TypeArgs(pub Arc<[TypeRef]>);

impl DependencyResolver for TypeArgs {
    type Error = LocateErrorKind;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
        declare::<TypeArgs>(dependencies, DependencyKind::TypeArgs);
    }

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
        match args.next() {
            Some(Resolved::Types(types)) => Ok(Self(types)),
            _ => Ok(Self(args.activation_type().args().into())),
        }
    }
}
