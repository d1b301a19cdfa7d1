use alloc::{collections::VecDeque, sync::Arc, vec::Vec};

use crate::{
    any::Instance,
    errors::LocateErrorKind,
    fallback::DeferredLocate,
    strategy::{DependencyInfo, ExportKey, Metadata},
    types::TypeRef,
};

/// Value produced for one declared dependency before the constructor runs.
#[derive(Debug, Clone)]
pub enum Resolved {
    One(Option<Instance>),
    Many(Vec<Instance>),
    Deferred(DeferredLocate),
    WithMeta(Instance, Metadata),
    Types(Arc<[TypeRef]>),
}

/// Resolved dependencies of one constructor, property or method call, in declaration order.
#[derive(Debug)]
pub struct ActivationArgs {
    values: VecDeque<Resolved>,
    activation_type: TypeRef,
}

impl ActivationArgs {
    #[inline]
    #[must_use]
    pub(crate) fn new(activation_type: TypeRef, values: VecDeque<Resolved>) -> Self {
        Self { values, activation_type }
    }

    /// Closed type being activated.
    #[inline]
    #[must_use]
    pub const fn activation_type(&self) -> &TypeRef {
        &self.activation_type
    }

    /// Takes the value of the next declared dependency.
    #[inline]
    pub fn next(&mut self) -> Option<Resolved> {
        self.values.pop_front()
    }

    #[must_use]
    pub fn missing(&self, dependency: ExportKey) -> LocateErrorKind {
        LocateErrorKind::MissingDependency {
            dependency,
            target: self.activation_type.clone(),
        }
    }
}

/// Extractor of a constructor, property or method argument.
///
/// `dependencies` declares what has to be resolved, `resolve` takes the resolved values
/// in the same order.
pub trait DependencyResolver: Sized {
    type Error: Into<LocateErrorKind>;

    fn dependencies(dependencies: &mut Vec<DependencyInfo>);

    fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error>;
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = LocateErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn dependencies(dependencies: &mut Vec<DependencyInfo>) {
                $( $ty::dependencies(dependencies); )*
            }

            #[inline]
            #[allow(unused_variables)]
            fn resolve(args: &mut ActivationArgs) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(args).map_err(Into::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
