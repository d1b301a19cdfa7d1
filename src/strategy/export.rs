use alloc::{
    boxed::Box,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::debug;

use super::{Constructor, ConstructorSelection, DependencyInfo, ExportEnvironment, LocateKey, MemberKind, Metadata};
use crate::{
    any::{Instance, TypeInfo},
    compiler::CompiledPlan,
    condition::Condition,
    dependency_resolver::ActivationArgs,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, LocateError, LocateErrorKind},
    finalizer::BoxedCloneFinalizer,
    immutable::SharedTree,
    lifestyle::Lifestyle,
    types::{Constraint, TypeRef},
    utils::unique_id,
};

/// Turns an instance of the activation type into its view as one export type.
pub(crate) type Caster = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;
/// Post-construction transform of the shared instance.
pub(crate) type Enricher = Arc<dyn Fn(Instance) -> Result<Instance, InstantiateErrorKind> + Send + Sync>;
/// Reads a member export out of the parent instance.
pub(crate) type Projection = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;
pub(crate) type InjectFn = Arc<
    dyn Fn(&mut (dyn Any + Send + Sync), &mut ActivationArgs) -> Result<(), InstantiatorErrorKind<LocateErrorKind, InstantiateErrorKind>>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub(crate) struct ExportAs {
    pub(crate) export: TypeRef,
    pub(crate) caster: Option<Caster>,
}

/// Moves a freshly constructed owned value into a shared [`Instance`].
#[derive(Clone, Copy)]
pub(crate) struct Carrier {
    pub(crate) value_type: TypeInfo,
    pub(crate) finish: fn(Box<dyn Any + Send + Sync>) -> Option<Instance>,
}

impl Carrier {
    #[must_use]
    pub(crate) fn of<T: Send + Sync + 'static>() -> Self {
        Self {
            value_type: TypeInfo::of::<T>(),
            finish: |value| value.downcast::<T>().ok().map(|value| Instance::new::<T>(Arc::from(value))),
        }
    }
}

/// Property or method injection applied to the owned value before it is shared.
#[derive(Clone)]
pub(crate) struct Injector {
    pub(crate) dependencies: Vec<DependencyInfo>,
    pub(crate) apply: InjectFn,
}

impl Injector {
    #[inline]
    fn order(&self) -> u8 {
        match self.dependencies.first().map(DependencyInfo::member) {
            Some(MemberKind::Method) => 1,
            _ => 0,
        }
    }
}

#[derive(Clone)]
pub(crate) enum Activation {
    Constructors(Vec<Constructor>),
    Instance(Instance),
    Member { parent: Weak<ExportStrategy>, project: Projection },
}

/// Member of the activation type exported on its own, see [`crate::ExportBuilder::export_member`].
#[derive(Clone)]
pub(crate) struct SecondaryExport {
    pub(crate) activation_type: TypeRef,
    pub(crate) names: Vec<Arc<str>>,
    pub(crate) project: Projection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StrategyRole {
    Export,
    Decorator,
}

/// One way to produce instances of an activation type.
///
/// Built by [`crate::RegistrationBlock`] and immutable once registered, apart from its cache of
/// compiled plans. Registered strategies are only reachable behind [`Arc`], so nothing can change
/// them once a plan exists. The first compiled plan marks the strategy as sealed for diagnostics.
pub struct ExportStrategy {
    pub(crate) id: u64,
    pub(crate) sequence: u64,
    pub(crate) activation_type: TypeRef,
    pub(crate) role: StrategyRole,
    pub(crate) exports: Vec<ExportAs>,
    pub(crate) names: Vec<Arc<str>>,
    pub(crate) key: Option<LocateKey>,
    pub(crate) priority: i32,
    pub(crate) environment: ExportEnvironment,
    pub(crate) lifestyle: Option<Arc<dyn Lifestyle>>,
    pub(crate) conditions: Vec<Arc<dyn Condition>>,
    pub(crate) metadata: Metadata,
    pub(crate) externally_owned: bool,
    pub(crate) activation: Activation,
    pub(crate) carrier: Option<Carrier>,
    pub(crate) injectors: Vec<Injector>,
    pub(crate) enrichers: Vec<Enricher>,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
    pub(crate) constructor_selection: Option<ConstructorSelection>,
    pub(crate) constraints: Vec<(u8, Constraint)>,
    pub(crate) members: Vec<SecondaryExport>,
    initialized: bool,
    sealed: AtomicBool,
    plans: SharedTree<TypeRef, Arc<CompiledPlan>>,
}

impl ExportStrategy {
    #[must_use]
    pub(crate) fn new(activation_type: TypeRef, activation: Activation) -> Self {
        let id = unique_id();
        Self {
            id,
            sequence: id,
            activation_type,
            role: StrategyRole::Export,
            exports: Vec::new(),
            names: Vec::new(),
            key: None,
            priority: 0,
            environment: ExportEnvironment::ANY,
            lifestyle: None,
            conditions: Vec::new(),
            metadata: Metadata::new(),
            externally_owned: false,
            activation,
            carrier: None,
            injectors: Vec::new(),
            enrichers: Vec::new(),
            finalizer: None,
            constructor_selection: None,
            constraints: Vec::new(),
            members: Vec::new(),
            initialized: false,
            sealed: AtomicBool::new(false),
            plans: SharedTree::new(),
        }
    }

    /// Finalizes derived state: the default self export and the order of injectors.
    ///
    /// Calling it more than once has no further effect.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        if self.exports.is_empty() && self.names.is_empty() {
            self.exports.push(ExportAs {
                export: self.activation_type.clone(),
                caster: None,
            });
        }
        self.injectors.sort_by_key(Injector::order);
        self.initialized = true;
    }

    /// Strategies for the exported members, activated through this strategy.
    #[must_use]
    pub(crate) fn member_strategies(self: &Arc<Self>) -> Vec<ExportStrategy> {
        self.members
            .iter()
            .map(|member| {
                let mut strategy = ExportStrategy::new(
                    member.activation_type.clone(),
                    Activation::Member {
                        parent: Arc::downgrade(self),
                        project: member.project.clone(),
                    },
                );
                strategy.names.clone_from(&member.names);
                strategy.environment = self.environment;
                strategy.externally_owned = true;
                strategy.initialize();
                strategy
            })
            .collect()
    }

    /// Compiled plan for `closed`, compiling and sealing the strategy on first use.
    pub(crate) fn plan_for(
        &self,
        closed: &TypeRef,
        compile: impl FnOnce() -> Result<CompiledPlan, LocateError>,
    ) -> Result<Arc<CompiledPlan>, LocateError> {
        if let Some(plan) = self.plans.get(closed) {
            return Ok(plan);
        }
        let plan = Arc::new(compile()?);
        if !self.sealed.swap(true, Ordering::AcqRel) {
            debug!(activation_type = %self.activation_type, "Strategy sealed");
        }
        Ok(self.plans.get_or_add(closed.clone(), plan))
    }

    /// Every dependency declared by constructors, properties and methods.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&DependencyInfo> {
        let constructors = match &self.activation {
            Activation::Constructors(constructors) => constructors.as_slice(),
            _ => &[],
        };
        constructors
            .iter()
            .flat_map(Constructor::dependencies)
            .chain(self.injectors.iter().flat_map(|injector| injector.dependencies.iter()))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        match &self.activation {
            Activation::Constructors(constructors) => constructors,
            _ => &[],
        }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn activation_type(&self) -> &TypeRef {
        &self.activation_type
    }

    #[inline]
    pub fn exports(&self) -> impl Iterator<Item = &TypeRef> {
        self.exports.iter().map(|export| &export.export)
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| &**name)
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> Option<&LocateKey> {
        self.key.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    #[must_use]
    pub const fn environment(&self) -> ExportEnvironment {
        self.environment
    }

    /// `"Transient"` when no lifestyle is set.
    #[inline]
    #[must_use]
    pub fn lifestyle_name(&self) -> &'static str {
        self.lifestyle.as_ref().map_or("Transient", |lifestyle| lifestyle.name())
    }

    #[inline]
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[inline]
    #[must_use]
    pub(crate) fn conditions(&self) -> &[Arc<dyn Condition>] {
        &self.conditions
    }

    #[inline]
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.activation_type.is_open()
    }

    #[inline]
    #[must_use]
    pub fn is_decorator(&self) -> bool {
        self.role == StrategyRole::Decorator
    }

    #[inline]
    #[must_use]
    pub const fn is_externally_owned(&self) -> bool {
        self.externally_owned
    }

    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Count of compiled plans, one per closed activation type.
    #[inline]
    #[must_use]
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }
}

impl Debug for ExportStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportStrategy")
            .field("id", &self.id)
            .field("activation_type", &self.activation_type)
            .field("exports", &self.exports().collect::<Vec<_>>())
            .field("names", &self.names)
            .field("key", &self.key)
            .field("priority", &self.priority)
            .field("lifestyle", &self.lifestyle_name())
            .field("conditions", &self.conditions.len())
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Activation, ExportStrategy};
    use crate::{any::Instance, types::TypeRef};

    use alloc::vec::Vec;

    struct Service;

    fn strategy() -> ExportStrategy {
        ExportStrategy::new(TypeRef::of::<Service>(), Activation::Instance(Instance::from_value(Service)))
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut strategy = strategy();
        strategy.initialize();
        let exports = strategy.exports().cloned().collect::<Vec<_>>();
        strategy.initialize();

        assert_eq!(strategy.exports().cloned().collect::<Vec<_>>(), exports);
        assert_eq!(exports, [TypeRef::of::<Service>()]);
    }

    #[test]
    fn test_named_strategy_has_no_default_export() {
        let mut strategy = strategy();
        strategy.names.push("service".into());
        strategy.initialize();

        assert_eq!(strategy.exports().count(), 0);
        assert_eq!(strategy.names().collect::<Vec<_>>(), ["service"]);
    }
}
