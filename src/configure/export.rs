use alloc::{sync::Arc, vec, vec::Vec};
use core::{any::Any, marker::PhantomData};

use crate::{
    any::Instance,
    condition::{Condition, Unless, WhenClassHas, WhenInjectedInto, WhenMemberHas, WhenMemberNamed, WhenTargetHas},
    context::InjectionContext,
    dependency_resolver::{ActivationArgs, DependencyResolver},
    errors::{InstantiateErrorKind, InstantiatorErrorKind, LocateErrorKind},
    finalizer::{boxed_finalizer_factory, disposable_finalizer, Disposable, Finalizer},
    instantiator::Instantiator,
    lifestyle::{
        Lifestyle, Singleton, SingletonPerAncestor, SingletonPerKey, SingletonPerNamedScope, SingletonPerObjectGraph, SingletonPerScope,
        Transient, WeakSingleton,
    },
    strategy::{
        Activation, Constructor, ConstructorSelection, DependencyInfo, ExportAs, ExportEnvironment, ExportStrategy, Injector, LocateKey,
        MemberKind, MetadataValue, SecondaryExport,
    },
    types::{Constraint, TypeRef},
};

/// Configures one strategy of a [`crate::RegistrationBlock`].
///
/// `T` is the value type the strategy constructs.
pub struct ExportBuilder<'a, T> {
    pub(crate) strategy: &'a mut ExportStrategy,
    _value: PhantomData<fn() -> T>,
}

impl<'a, T> ExportBuilder<'a, T> {
    #[inline]
    pub(crate) fn new(strategy: &'a mut ExportStrategy) -> Self {
        Self {
            strategy,
            _value: PhantomData,
        }
    }

    /// Id of the strategy, see [`crate::Container::remove_strategy`].
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.strategy.id
    }

    /// Exports the strategy as a runtime type, e.g. an open generic pattern like `IRepository<T0>`.
    ///
    /// Instances keep the view of the value type.
    pub fn as_type_ref(self, export: TypeRef) -> Self {
        self.strategy.exports.push(ExportAs { export, caster: None });
        self
    }

    pub fn as_name(self, name: impl Into<Arc<str>>) -> Self {
        self.strategy.names.push(name.into());
        self
    }

    /// Only locates with an equal key see the strategy, see [`crate::Container::locate_keyed`].
    pub fn with_key(self, key: impl Into<LocateKey>) -> Self {
        self.strategy.key = Some(key.into());
        self
    }

    /// Higher priority wins over registration order.
    pub fn with_priority(self, priority: i32) -> Self {
        self.strategy.priority = priority;
        self
    }

    pub fn when(self, condition: impl Condition + 'static) -> Self {
        self.strategy.conditions.push(Arc::new(condition));
        self
    }

    pub fn unless(self, condition: impl Condition + 'static) -> Self {
        self.strategy.conditions.push(Arc::new(Unless(Arc::new(condition))));
        self
    }

    pub fn when_injected_into<K: ?Sized + 'static>(self) -> Self {
        self.when(WhenInjectedInto(vec![TypeRef::of::<K>()]))
    }

    pub fn when_class_has(self, attribute: impl Into<Arc<str>>) -> Self {
        self.when(WhenClassHas(attribute.into()))
    }

    pub fn when_member_has(self, attribute: impl Into<Arc<str>>) -> Self {
        self.when(WhenMemberHas(attribute.into()))
    }

    pub fn when_target_has(self, attribute: impl Into<Arc<str>>) -> Self {
        self.when(WhenTargetHas(attribute.into()))
    }

    pub fn when_member_named(self, name: impl Into<Arc<str>>) -> Self {
        self.when(WhenMemberNamed(name.into()))
    }

    pub fn with_lifestyle(self, lifestyle: impl Lifestyle + 'static) -> Self {
        self.strategy.lifestyle = Some(Arc::new(lifestyle));
        self
    }

    /// New instance on every locate. The default.
    pub fn transient(self) -> Self {
        self.with_lifestyle(Transient)
    }

    /// One instance for the scope the strategy is registered in.
    pub fn singleton(self) -> Self {
        self.with_lifestyle(Singleton::new())
    }

    pub fn singleton_per_scope(self) -> Self {
        self.with_lifestyle(SingletonPerScope)
    }

    pub fn singleton_per_named_scope(self, scope_name: impl Into<Arc<str>>) -> Self {
        self.with_lifestyle(SingletonPerNamedScope::new(scope_name))
    }

    /// One instance per key computed from the injection context.
    pub fn singleton_per_key(self, key: impl Fn(&InjectionContext) -> Option<LocateKey> + Send + Sync + 'static) -> Self {
        self.with_lifestyle(SingletonPerKey::new(key))
    }

    pub fn singleton_per_object_graph(self) -> Self {
        self.with_lifestyle(SingletonPerObjectGraph)
    }

    /// One instance shared below the nearest ancestor of type `A` being activated.
    pub fn singleton_per_ancestor<A: ?Sized + 'static>(self) -> Self {
        self.with_lifestyle(SingletonPerAncestor::of::<A>())
    }

    /// Shared while someone holds it, rematerialized after the last handle is dropped.
    pub fn weak_singleton(self) -> Self {
        self.with_lifestyle(WeakSingleton::new())
    }

    pub fn with_metadata(self, key: impl Into<Arc<str>>, value: impl Into<MetadataValue>) -> Self {
        self.strategy.metadata = self.strategy.metadata.with(key, value);
        self
    }

    /// Overrides how parameter `index` of the last added constructor is satisfied.
    ///
    /// ```
    /// # use grove::{Container, Inject};
    /// # use std::sync::Arc;
    /// struct Port(u16);
    /// struct Server(Arc<Port>);
    ///
    /// let container = Container::new();
    /// container
    ///     .configure(|block| {
    ///         block
    ///             .export::<Server>()
    ///             .constructor(|Inject(port): Inject<Port>| Ok(Server(port)))
    ///             .with_ctor_param(0, |param| param.with_default(Port(8080)));
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(container.locate::<Server>().unwrap().0 .0, 8080);
    /// ```
    pub fn with_ctor_param(self, index: usize, configure: impl FnOnce(DependencyInfo) -> DependencyInfo) -> Self {
        if let Activation::Constructors(constructors) = &mut self.strategy.activation {
            if let Some(dependency) = constructors.last_mut().and_then(|constructor| constructor.dependency_mut(index)) {
                *dependency = configure(dependency.clone());
            }
        }
        self
    }

    /// Restricts the strategy to the given environments.
    pub fn in_environment(self, environment: ExportEnvironment) -> Self {
        self.strategy.environment = environment;
        self
    }

    pub fn using_constructor_selection(self, selection: ConstructorSelection) -> Self {
        self.strategy.constructor_selection = Some(selection);
        self
    }

    /// Extra constraint on parameter `index` of an open generic activation type.
    pub fn with_constraint(self, index: u8, constraint: Constraint) -> Self {
        self.strategy.constraints.push((index, constraint));
        self
    }

    /// Instances are never tracked for disposal.
    pub fn externally_owned(self) -> Self {
        self.strategy.externally_owned = true;
        self
    }
}

impl<T: Send + Sync + 'static> ExportBuilder<'_, T> {
    /// Adds a constructor. With several constructors one is picked by the
    /// [`ConstructorSelection`] policy when the plan is compiled.
    pub fn constructor<Inst, Deps>(self, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T, Error = InstantiateErrorKind> + Send + Sync,
        Deps: DependencyResolver<Error = LocateErrorKind>,
    {
        let constructor = Constructor::new::<Inst, Deps>(instantiator);
        match &mut self.strategy.activation {
            Activation::Constructors(constructors) => constructors.push(constructor),
            activation => *activation = Activation::Constructors(vec![constructor]),
        }
        self
    }

    /// Exports the strategy as `K`, e.g. a trait object, see [`crate::upcast`].
    pub fn as_type<K>(self, cast: impl Fn(Arc<T>) -> Arc<K> + Send + Sync + 'static) -> Self
    where
        K: ?Sized + Send + Sync + 'static,
    {
        let caster = move |instance: &Instance| instance.downcast_value::<T>().map(|value| instance.with_view(cast(value)));
        self.strategy.exports.push(ExportAs {
            export: TypeRef::of::<K>(),
            caster: Some(Arc::new(caster)),
        });
        self
    }

    /// Exports the strategy as its own type, next to other exports.
    pub fn as_self(self) -> Self {
        let export = self.strategy.activation_type.clone();
        self.as_type_ref(export)
    }

    /// Injects `D` into the constructed value before it is shared.
    ///
    /// Properties are injected before methods, each group in registration order.
    pub fn import_property<D>(self, set: impl Fn(&mut T, D) + Send + Sync + 'static) -> Self
    where
        D: DependencyResolver,
    {
        self.injector::<D>(MemberKind::Property, set)
    }

    /// Calls `call` with the resolved `D` on the constructed value, after property injection.
    pub fn import_method<D>(self, call: impl Fn(&mut T, D) + Send + Sync + 'static) -> Self
    where
        D: DependencyResolver,
    {
        self.injector::<D>(MemberKind::Method, call)
    }

    fn injector<D: DependencyResolver>(self, member: MemberKind, apply: impl Fn(&mut T, D) + Send + Sync + 'static) -> Self {
        let mut dependencies = Vec::new();
        D::dependencies(&mut dependencies);
        let dependencies = dependencies.into_iter().map(|dependency| dependency.at(member)).collect();

        let apply = move |value: &mut (dyn Any + Send + Sync),
                          args: &mut ActivationArgs|
              -> Result<(), InstantiatorErrorKind<LocateErrorKind, InstantiateErrorKind>> {
            let Some(value) = value.downcast_mut::<T>() else {
                return Err(InstantiatorErrorKind::Factory(InstantiateErrorKind::message("injected value has another type")));
            };
            let resolved = D::resolve(args).map_err(|err| InstantiatorErrorKind::Deps(err.into()))?;
            apply(value, resolved);
            Ok(())
        };
        self.strategy.injectors.push(Injector {
            dependencies,
            apply: Arc::new(apply),
        });
        self
    }

    /// Post-construction transform of the shared value, applied in registration order.
    pub fn enrich_with<E>(self, enrich: impl Fn(Arc<T>) -> Result<Arc<T>, E> + Send + Sync + 'static) -> Self
    where
        E: Into<InstantiateErrorKind>,
    {
        let enricher = move |instance: Instance| -> Result<Instance, InstantiateErrorKind> {
            match instance.downcast_value::<T>() {
                Some(value) => enrich(value).map(Instance::new).map_err(Into::into),
                None => Ok(instance),
            }
        };
        self.strategy.enrichers.push(Arc::new(enricher));
        self
    }

    /// Finalizer run when the disposal scope tracking the instance is disposed.
    pub fn disposal(self, finalizer: impl Finalizer<T>) -> Self {
        self.strategy.finalizer = Some(boxed_finalizer_factory(finalizer));
        self
    }

    /// Disposes instances through [`Disposable::dispose`].
    pub fn disposable(self) -> Self
    where
        T: Disposable,
    {
        self.strategy.finalizer = Some(disposable_finalizer::<T>());
        self
    }

    /// Exports a member of the value, located through this strategy.
    ///
    /// The member is never disposed by the container.
    pub fn export_member<M>(self, project: impl Fn(&T) -> Arc<M> + Send + Sync + 'static) -> Self
    where
        M: Send + Sync + 'static,
    {
        self.export_member_as(Vec::new(), project)
    }

    /// Like [`Self::export_member`], exported under `name` instead of its type.
    pub fn export_member_named<M>(self, name: impl Into<Arc<str>>, project: impl Fn(&T) -> Arc<M> + Send + Sync + 'static) -> Self
    where
        M: Send + Sync + 'static,
    {
        self.export_member_as(vec![name.into()], project)
    }

    fn export_member_as<M>(self, names: Vec<Arc<str>>, project: impl Fn(&T) -> Arc<M> + Send + Sync + 'static) -> Self
    where
        M: Send + Sync + 'static,
    {
        let project = move |instance: &Instance| instance.downcast_value::<T>().map(|value| Instance::new(project(&value)));
        self.strategy.members.push(SecondaryExport {
            activation_type: TypeRef::of::<M>(),
            names,
            project: Arc::new(project),
        });
        self
    }
}
