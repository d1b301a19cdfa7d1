use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use super::ExportBuilder;
use crate::{
    any::Instance,
    strategy::{Activation, Carrier, ExportStrategy, StrategyRole},
    types::{GenericDef, TypeDescriptor, TypeRef},
};

/// Strategies and type descriptors registered together, see [`crate::Container::configure`].
#[derive(Default)]
pub struct RegistrationBlock {
    strategies: Vec<ExportStrategy>,
    descriptors: Vec<(TypeRef, TypeDescriptor)>,
}

impl RegistrationBlock {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push<T>(&mut self, strategy: ExportStrategy) -> ExportBuilder<'_, T> {
        self.strategies.push(strategy);
        let index = self.strategies.len() - 1;
        ExportBuilder::new(&mut self.strategies[index])
    }

    /// Exports `T`, constructed by the constructors added to the returned builder.
    ///
    /// Without `as_*` calls the strategy is exported as `T` itself.
    pub fn export<T: Send + Sync + 'static>(&mut self) -> ExportBuilder<'_, T> {
        let mut strategy = ExportStrategy::new(TypeRef::of::<T>(), Activation::Constructors(Vec::new()));
        strategy.carrier = Some(Carrier::of::<T>());
        self.push(strategy)
    }

    /// Exports an already built value. The container never disposes it.
    pub fn export_instance<T: Send + Sync + 'static>(&mut self, value: T) -> ExportBuilder<'_, T> {
        let mut strategy = ExportStrategy::new(TypeRef::of::<T>(), Activation::Instance(Instance::from_value(value)));
        strategy.externally_owned = true;
        self.push(strategy)
    }

    /// Exports the open generic `def`, constructed as the runtime value `T`.
    ///
    /// Every closing of `def` (e.g. `def<String>`) is activated by the same constructors,
    /// which read the closing through [`crate::TypeArgs`]. Export patterns are added with
    /// [`ExportBuilder::as_type_ref`] and may only mention the parameters of `def`.
    pub fn export_open<T: Send + Sync + 'static>(&mut self, def: GenericDef) -> ExportBuilder<'_, T> {
        let mut strategy = ExportStrategy::new(def.open(), Activation::Constructors(Vec::new()));
        strategy.carrier = Some(Carrier::of::<T>());
        self.push(strategy)
    }

    /// Decorator of the types it's exported as, applied after the decorated instance is located.
    ///
    /// The decorated instance is injected through [`crate::Decorated`].
    pub fn decorator<T: Send + Sync + 'static>(&mut self) -> ExportBuilder<'_, T> {
        let mut builder = self.export::<T>();
        builder.strategy.role = StrategyRole::Decorator;
        builder
    }

    /// Decorator of an open generic, see [`Self::export_open`].
    pub fn decorator_open<T: Send + Sync + 'static>(&mut self, def: GenericDef) -> ExportBuilder<'_, T> {
        let mut builder = self.export_open::<T>(def);
        builder.strategy.role = StrategyRole::Decorator;
        builder
    }

    /// Adds a strategy built elsewhere, e.g. by a configuration translator.
    pub fn add_strategy(&mut self, strategy: ExportStrategy) {
        self.strategies.push(strategy);
    }

    /// Registers or extends the descriptor of `ty` when the block is committed.
    pub fn describe(&mut self, ty: TypeRef, descriptor: TypeDescriptor) {
        self.descriptors.push((ty, descriptor));
    }

    #[inline]
    pub fn describe_type<T: ?Sized + 'static>(&mut self, descriptor: TypeDescriptor) {
        self.describe(TypeRef::of::<T>(), descriptor);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty() && self.descriptors.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<ExportStrategy>, Vec<(TypeRef, TypeDescriptor)>) {
        (self.strategies, self.descriptors)
    }
}

impl Debug for RegistrationBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationBlock")
            .field("strategies", &self.strategies)
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}
