#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod compiler;
pub(crate) mod condition;
pub(crate) mod config;
pub(crate) mod configure;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod diagnostics;
pub(crate) mod disposal;
pub(crate) mod errors;
pub(crate) mod fallback;
pub(crate) mod finalizer;
pub(crate) mod immutable;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod lifestyle;
pub(crate) mod lock;
pub(crate) mod resolve;
pub(crate) mod service;
pub(crate) mod strategy;
pub(crate) mod types;
pub(crate) mod utils;

#[doc(hidden)]
pub mod __private {
    pub use alloc::sync::Arc;
}

pub use any::{Instance, TypeInfo, WeakInstance};
pub use cache::{CacheKey, ScopeCache};
pub use compiler::{ActivationFn, CompiledPlan, PlanInfo};
pub use condition::{
    metadata_filter, Condition, ConditionContext, ExportFilter, FnCondition, RequestTimeCondition, Unless, WhenClassHas,
    WhenInjectedInto, WhenMemberHas, WhenMemberNamed, WhenTargetHas,
};
pub use config::ContainerConfig;
pub use configure::{ExportBuilder, RegistrationBlock};
pub use container::{ChildContainerBuilder, Container, LifetimeScope, LocateOptions, WeakContainer};
pub use context::{ExtraData, InjectionContext, InjectionSite};
pub use dependency_resolver::{ActivationArgs, DependencyResolver, Resolved};
pub use diagnostics::{Diagnostics, PossibleMissingDependency, StrategyInfo};
pub use disposal::{DisposalScope, DisposalScopeProvider};
pub use errors::{
    CollectionErrorKind, ConfigurationErrorKind, DisposalErrorKind, InstantiateErrorKind, InstantiatorErrorKind,
    InstantiatorResult, LocateError, LocateErrorKind, LocationTrail, TrailEntry,
};
pub use fallback::{
    DeferredLocate, Factory, FactoryInstance, KeyedFactory, KeyedFactoryInstance, Lazy, LazyInstance, LocateRequestInfo, Meta,
    MetaInstance, MissingExportStrategyProvider, SecondaryLocator,
};
pub use finalizer::{Disposable, FinalizeOutput, Finalizer};
pub use immutable::{ImmutableList, ImmutableTree, SharedList, SharedTree};
pub use inject::{Decorated, Inject, InjectAll, InjectFactory, InjectKeyedFactory, InjectLazy, InjectMeta, InjectOptional, TypeArgs};
pub use instantiator::{instance, Instantiator};
pub use lifestyle::{
    Lifestyle, Singleton, SingletonPerAncestor, SingletonPerKey, SingletonPerNamedScope, SingletonPerObjectGraph, SingletonPerScope,
    Transient, WeakSingleton,
};
pub use strategy::{
    Constructor, ConstructorSelection, DependencyInfo, DependencyKind, ExportEnvironment, ExportKey, ExportStrategy, LocateKey,
    MemberKind, Metadata, MetadataValue,
};
pub use types::{
    well_known, Attribute, Attributes, Constraint, GenericDef, GenericParam, TypeDescriptor, TypeHead, TypeKind, TypeRef,
    TypeRegistry,
};
