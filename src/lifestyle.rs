//! Policies deciding how activated instances are shared and where they are disposed.

mod ancestor;
mod graph;
mod keyed;
mod scoped;
mod singleton;
mod transient;
mod weak;

use alloc::sync::Arc;

pub use ancestor::SingletonPerAncestor;
pub use graph::SingletonPerObjectGraph;
pub use keyed::SingletonPerKey;
pub use scoped::{SingletonPerNamedScope, SingletonPerScope};
pub use singleton::Singleton;
pub use transient::Transient;
pub use weak::WeakSingleton;

use crate::{
    any::Instance,
    compiler::{ActivationFn, PlanInfo},
    container::Container,
    context::InjectionContext,
    errors::LocateError,
};

/// Sharing policy wrapped around a compiled activation.
///
/// A strategy holds one prototype, every compiled plan gets its own state through [`Lifestyle::fork`].
/// Implementations that share instances must materialize each slot at most once under concurrent
/// callers, and track the instance in the disposal scope matching the sharing granularity.
pub trait Lifestyle: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fresh policy state for one compiled plan.
    fn fork(&self) -> Arc<dyn Lifestyle>;

    #[inline]
    fn is_transient(&self) -> bool {
        false
    }

    /// Returns an instance for `plan`, calling `activate` whenever a new one has to be constructed.
    ///
    /// `owner` is the scope the strategy is registered in.
    ///
    /// # Errors
    /// Returns the activation error or a policy specific configuration error.
    fn activate(
        &self,
        plan: &PlanInfo,
        activate: &ActivationFn,
        owner: &Container,
        context: &mut InjectionContext,
    ) -> Result<Instance, LocateError>;
}
