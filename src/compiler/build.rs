use alloc::{
    collections::VecDeque,
    format,
    sync::{Arc, Weak},
    vec::Vec,
};
use tracing::debug;

use super::{ActivationFn, CompiledPlan, DependencyFn, PlanInfo};
use crate::{
    any::{Instance, TypeInfo},
    container::Container,
    context::InjectionContext,
    dependency_resolver::ActivationArgs,
    errors::{ConfigurationErrorKind, InstantiateErrorKind, InstantiatorErrorKind, LocateError, LocateErrorKind},
    finalizer::BoxedCloneFinalizer,
    instantiator::BoxedCloneInstantiator,
    service::Service as _,
    strategy::{Activation, Constructor, ConstructorSelection, DependencyInfo, Enricher, ExportKey, ExportStrategy, InjectFn, Projection},
    types::{TypeRef, TypeRegistry},
    utils::unique_id,
};

type CompiledInjector = (Arc<[DependencyFn]>, InjectFn);

/// Steps shared by every kind of activation once the instance exists.
struct Tail {
    activation_type: TypeRef,
    enrichers: Arc<[Enricher]>,
    finalizer: Option<BoxedCloneFinalizer>,
}

impl Tail {
    fn finish(&self, mut instance: Instance, name: &'static str, context: &InjectionContext) -> Result<Instance, LocateError> {
        for enricher in self.enrichers.iter() {
            instance = enricher(instance).map_err(|source| self.activation_error(context, source))?;
        }
        if let Some(finalizer) = &self.finalizer {
            context.track(name, &instance, finalizer.clone(), &self.activation_type)?;
        }
        Ok(instance)
    }

    fn activation_error(&self, context: &InjectionContext, source: InstantiateErrorKind) -> LocateError {
        context.error(LocateErrorKind::Activation {
            activation_type: self.activation_type.clone(),
            source,
        })
    }
}

fn dependency_fns(dependencies: &[DependencyInfo], target: &TypeRef, types: &TypeRegistry) -> Arc<[DependencyFn]> {
    dependencies
        .iter()
        .cloned()
        .map(|dependency| DependencyFn::new(dependency, target, types))
        .collect()
}

fn resolve_args(dependencies: &[DependencyFn], activation_type: &TypeRef, context: &InjectionContext) -> Result<ActivationArgs, LocateError> {
    let mut values = VecDeque::with_capacity(dependencies.len());
    for dependency in dependencies {
        values.push_back(dependency.resolve(context)?);
    }
    Ok(ActivationArgs::new(activation_type.clone(), values))
}

fn instantiator_error(
    context: &InjectionContext,
    tail: &Tail,
    err: InstantiatorErrorKind<LocateErrorKind, InstantiateErrorKind>,
) -> LocateError {
    match err {
        InstantiatorErrorKind::Deps(kind) => context.error(kind),
        InstantiatorErrorKind::Factory(source) => tail.activation_error(context, source),
    }
}

/// Constructor choice of one plan.
///
/// `BestMatch` between several constructors depends on what the scope of the locate call can
/// resolve, so it's made per scope and remembered there until registrations change.
enum Selection {
    Fixed(usize),
    PerScope {
        slot: u64,
        policy: ConstructorSelection,
        constructors: Arc<[Constructor]>,
    },
}

fn select_in(
    scope: &Container,
    policy: ConstructorSelection,
    constructors: &[Constructor],
    closed: &TypeRef,
) -> Result<usize, ConfigurationErrorKind> {
    policy
        .select(constructors, |dependency| scope.can_resolve(dependency.requested(), dependency.key()))
        .map_err(|missing| ConfigurationErrorKind::NoResolvableConstructor {
            activation_type: closed.clone(),
            missing,
        })
}

impl Selection {
    fn index(&self, scope: &Container, closed: &TypeRef) -> Result<usize, ConfigurationErrorKind> {
        match self {
            Self::Fixed(index) => Ok(*index),
            Self::PerScope {
                slot,
                policy,
                constructors,
            } => scope.selected_constructor(*slot, || {
                let index = select_in(scope, *policy, constructors, closed)?;
                debug!(activation_type = %closed, constructor = index, scope = scope.name(), "Constructor selected");
                Ok(index)
            }),
        }
    }
}

struct CompiledConstructor {
    dependencies: Arc<[DependencyFn]>,
    build: BoxedCloneInstantiator,
    provides: TypeInfo,
}

fn constructor_activation(
    strategy: &ExportStrategy,
    constructors: &[Constructor],
    closed: &TypeRef,
    requesting: &Container,
    tail: Tail,
) -> Result<Arc<ActivationFn>, ConfigurationErrorKind> {
    let no_constructor = || ConfigurationErrorKind::NoConstructor {
        activation_type: closed.clone(),
    };
    let Some(carrier) = strategy.carrier else {
        return Err(no_constructor());
    };
    if constructors.is_empty() {
        return Err(no_constructor());
    }

    let policy = strategy
        .constructor_selection
        .unwrap_or(requesting.config().constructor_selection);
    let selection = if constructors.len() > 1 && policy == ConstructorSelection::BestMatch {
        Selection::PerScope {
            slot: unique_id(),
            policy,
            constructors: constructors.into(),
        }
    } else {
        let index = select_in(requesting, policy, constructors, closed)?;
        debug!(activation_type = %closed, constructor = index, "Constructor selected");
        Selection::Fixed(index)
    };
    // Fails early for the compiling scope, other scopes select on first activation
    selection.index(requesting, closed)?;

    let types = requesting.types();
    let compiled = constructors
        .iter()
        .map(|constructor| CompiledConstructor {
            dependencies: dependency_fns(constructor.dependencies(), closed, types),
            build: constructor.build.clone(),
            provides: constructor.provides(),
        })
        .collect::<Arc<[CompiledConstructor]>>();
    let injectors = strategy
        .injectors
        .iter()
        .map(|injector| (dependency_fns(&injector.dependencies, closed, types), injector.apply.clone()))
        .collect::<Arc<[CompiledInjector]>>();

    Ok(Arc::new(move |context: &mut InjectionContext| {
        let nested = context.nested(&tail.activation_type)?;

        let index = selection
            .index(nested.requesting(), &tail.activation_type)
            .map_err(|kind| nested.error(kind.into()))?;
        let constructor = &compiled[index];

        let args = resolve_args(&constructor.dependencies, &tail.activation_type, &nested)?;
        let mut value = constructor
            .build
            .clone()
            .call(args)
            .map_err(|err| instantiator_error(&nested, &tail, err))?;

        for (dependencies, apply) in injectors.iter() {
            let mut args = resolve_args(dependencies, &tail.activation_type, &nested)?;
            apply(&mut *value, &mut args).map_err(|err| instantiator_error(&nested, &tail, err))?;
        }

        let Some(instance) = (carrier.finish)(value) else {
            return Err(nested.error(LocateErrorKind::IncorrectType {
                expected: carrier.value_type.name,
                actual: constructor.provides.name,
            }));
        };
        tail.finish(instance, carrier.value_type.name, &nested)
    }))
}

fn member_activation(
    parent: &Weak<ExportStrategy>,
    project: Projection,
    owner: &Container,
    requesting: &Container,
    tail: Tail,
) -> Result<Arc<ActivationFn>, LocateError> {
    let trail_capacity = requesting.config().trail_capacity;
    let invalid = |message: &str| LocateError::new(ConfigurationErrorKind::Invalid(message.into()).into(), trail_capacity);

    let Some(parent) = parent.upgrade() else {
        return Err(invalid("the strategy owning the member export was removed"));
    };
    if parent.is_open() {
        return Err(invalid(&format!("member exports of open generic {} are not supported", parent.activation_type())));
    }
    let parent_type = parent.activation_type().clone();
    let parent_plan = parent.plan_for(&parent_type, || compile(&parent, &parent_type, owner, requesting))?;
    let owner = owner.downgrade();

    Ok(Arc::new(move |context: &mut InjectionContext| {
        let Some(owner) = owner.upgrade() else {
            return Err(context.error(LocateErrorKind::ContainerDropped {
                requested: ExportKey::Type(tail.activation_type.clone()),
            }));
        };
        let parent = parent_plan.execute(&owner, context)?;
        let Some(instance) = project(&parent) else {
            return Err(context.error(LocateErrorKind::Configuration(ConfigurationErrorKind::InvalidCast {
                export: tail.activation_type.clone(),
                activation_type: parent_plan.info().activation_type().clone(),
            })));
        };
        let name = instance.value_type().name;
        tail.finish(instance, name, context)
    }))
}

/// Builds the plan of `strategy` for the closed type `closed`.
///
/// `owner` is the scope the strategy is registered in, `requesting` the scope of the locate call
/// that triggered compilation. A `BestMatch` between several constructors is made again for every
/// other scope activating the plan, see [`Container::selected_constructor`].
///
/// # Errors
/// Returns a configuration error if no constructor can be selected or the type is still open.
pub(crate) fn compile(
    strategy: &ExportStrategy,
    closed: &TypeRef,
    owner: &Container,
    requesting: &Container,
) -> Result<CompiledPlan, LocateError> {
    let config = requesting.config();
    let error = |kind: ConfigurationErrorKind| LocateError::new(kind.into(), config.trail_capacity);
    if closed.is_open() {
        return Err(error(ConfigurationErrorKind::OpenActivation {
            activation_type: closed.clone(),
        }));
    }

    let lifestyle = strategy.lifestyle.as_ref().map(|lifestyle| lifestyle.fork());
    let transient = lifestyle.as_ref().map_or(true, |lifestyle| lifestyle.is_transient());
    let track = !strategy.externally_owned && (!transient || config.track_disposable_transients);
    let tail = Tail {
        activation_type: closed.clone(),
        enrichers: strategy.enrichers.iter().cloned().collect::<Vec<_>>().into(),
        finalizer: if track { strategy.finalizer.clone() } else { None },
    };

    let activate: Arc<ActivationFn> = match &strategy.activation {
        Activation::Instance(instance) => {
            let instance = instance.clone();
            let name = instance.value_type().name;
            Arc::new(move |context: &mut InjectionContext| tail.finish(instance.clone(), name, context))
        }
        Activation::Member { parent, project } => member_activation(parent, project.clone(), owner, requesting, tail)?,
        Activation::Constructors(constructors) => constructor_activation(strategy, constructors, closed, requesting, tail).map_err(error)?,
    };

    let info = PlanInfo {
        id: unique_id(),
        activation_type: closed.clone(),
        strategy_id: strategy.id(),
    };
    debug!(
        activation_type = %closed,
        lifestyle = strategy.lifestyle_name(),
        tracked = track && strategy.finalizer.is_some(),
        "Plan compiled"
    );

    Ok(CompiledPlan { info, lifestyle, activate })
}
