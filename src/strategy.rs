//! The unit of registration: one way to produce instances of an activation type.

mod collection;
mod constructor;
mod dependency;
mod environment;
mod export;
mod key;
mod metadata;

pub(crate) use collection::StrategyCollection;
pub use constructor::{Constructor, ConstructorSelection};
pub use dependency::{DependencyInfo, DependencyKind, MemberKind};
pub use environment::ExportEnvironment;
pub(crate) use export::{Activation, Carrier, Caster, Enricher, ExportAs, InjectFn, Injector, Projection, SecondaryExport, StrategyRole};
pub use export::ExportStrategy;
pub(crate) use key::StorageKey;
pub use key::{ExportKey, LocateKey};
pub use metadata::{Metadata, MetadataValue};
