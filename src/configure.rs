//! Registration surface: [`RegistrationBlock`] collects strategies, [`Container::configure`]
//! validates them and publishes them to a scope at once.

mod block;
mod export;

use alloc::{format, sync::Arc, vec::Vec};
use tracing::{debug, error};

pub use block::RegistrationBlock;
pub use export::ExportBuilder;

use crate::{
    container::Container,
    errors::ConfigurationErrorKind,
    strategy::{Activation, ExportKey, ExportStrategy, StorageKey, StrategyRole},
    utils::unique_id,
};

fn invalid(strategy: &ExportStrategy, reason: &str) -> ConfigurationErrorKind {
    ConfigurationErrorKind::Invalid(format!("{}: {reason}", strategy.activation_type()))
}

/// Checks an initialized strategy before it becomes visible.
fn validate(strategy: &ExportStrategy) -> Result<(), ConfigurationErrorKind> {
    if let Activation::Constructors(constructors) = &strategy.activation {
        if constructors.is_empty() || strategy.carrier.is_none() {
            return Err(ConfigurationErrorKind::NoConstructor {
                activation_type: strategy.activation_type().clone(),
            });
        }
    }

    if strategy.is_open() {
        if strategy.names().next().is_some() {
            return Err(invalid(strategy, "open generic strategies can't be exported by name"));
        }
        if strategy.exports().any(|export| !export.is_open() || export.def().is_none()) {
            return Err(invalid(strategy, "open generic strategies can only be exported as open generics"));
        }
        if !strategy.members.is_empty() {
            return Err(invalid(strategy, "members of open generic strategies can't be exported"));
        }
    } else if strategy.exports().any(|export| export.is_open()) {
        return Err(invalid(strategy, "closed strategies can't be exported as open generics"));
    }

    if strategy.is_decorator() && strategy.names().next().is_some() {
        return Err(invalid(strategy, "decorators apply to exported types only"));
    }
    Ok(())
}

/// Keys the strategy is stored under, without duplicates.
fn storage_keys(strategy: &ExportStrategy) -> Vec<StorageKey> {
    let mut keys = strategy
        .exports()
        .map(StorageKey::for_type)
        .chain(strategy.names().map(|name| StorageKey::Export(ExportKey::name(name))))
        .collect::<Vec<_>>();
    keys.sort();
    keys.dedup();
    keys
}

impl Container {
    /// Validates every strategy of `block`, then publishes all of them to this scope in one step.
    pub(crate) fn commit(&self, block: RegistrationBlock) -> Result<(), ConfigurationErrorKind> {
        let (mut strategies, descriptors) = block.into_parts();

        for strategy in &mut strategies {
            strategy.initialize();
        }
        if let Some(err) = strategies.iter().find_map(|strategy| validate(strategy).err()) {
            error!("{}", err);
            return Err(err);
        }

        let types = self.types();
        for (ty, descriptor) in descriptors {
            types.describe(&ty, descriptor);
        }

        let mut exports = Vec::new();
        let mut decorators = Vec::new();
        for mut strategy in strategies {
            strategy.sequence = unique_id();
            let strategy = Arc::new(strategy);
            // Assignability is a fact about the types, so it's recorded tree-wide even when
            // the strategy itself is only visible from this scope.
            for export in strategy.exports() {
                types.add_base(strategy.activation_type(), export.clone());
            }

            let target = match strategy.role {
                StrategyRole::Export => &mut exports,
                StrategyRole::Decorator => &mut decorators,
            };
            target.extend(storage_keys(&strategy).into_iter().map(|key| (key, strategy.clone())));

            for mut member in strategy.member_strategies() {
                member.sequence = unique_id();
                let member = Arc::new(member);
                exports.extend(storage_keys(&member).into_iter().map(|key| (key, member.clone())));
            }
            debug!(activation_type = %strategy.activation_type(), lifestyle = strategy.lifestyle_name(), "Strategy registered");
        }

        self.publish(&self.inner.strategies, &exports);
        self.publish(&self.inner.decorators, &decorators);
        debug!(exports = exports.len(), decorators = decorators.len(), scope = self.name(), "Registrations published");
        Ok(())
    }
}
