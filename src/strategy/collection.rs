use alloc::{sync::Arc, vec::Vec};
use core::{
    cmp::Reverse,
    fmt::{self, Debug, Formatter},
};

use super::ExportStrategy;

/// Strategies registered under one storage key, highest priority first, then in registration order.
///
/// Copy-on-write: adding or removing builds a new collection, in-flight resolutions keep the old one.
#[derive(Clone)]
pub(crate) struct StrategyCollection {
    items: Arc<[Arc<ExportStrategy>]>,
}

impl StrategyCollection {
    #[inline]
    #[must_use]
    pub(crate) fn single(strategy: Arc<ExportStrategy>) -> Self {
        Self {
            items: Arc::from([strategy]),
        }
    }

    #[must_use]
    pub(crate) fn added(&self, strategy: Arc<ExportStrategy>) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(strategy);
        items.sort_by_key(|strategy| (Reverse(strategy.priority), strategy.sequence));
        Self { items: items.into() }
    }

    /// `None` when the strategy isn't in the collection.
    #[must_use]
    pub(crate) fn removed(&self, id: u64) -> Option<Self> {
        if !self.items.iter().any(|strategy| strategy.id == id) {
            return None;
        }
        Some(Self {
            items: self.items.iter().filter(|strategy| strategy.id != id).cloned().collect(),
        })
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<ExportStrategy>> {
        self.items.iter()
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Debug for StrategyCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::StrategyCollection;
    use crate::{
        any::Instance,
        strategy::{Activation, ExportStrategy},
        types::TypeRef,
    };

    use alloc::{sync::Arc, vec::Vec};

    fn strategy(priority: i32) -> Arc<ExportStrategy> {
        let mut strategy = ExportStrategy::new(TypeRef::of::<u8>(), Activation::Instance(Instance::from_value(priority)));
        strategy.priority = priority;
        Arc::new(strategy)
    }

    #[test]
    fn test_ordered_by_priority_then_sequence() {
        let first = strategy(0);
        let second = strategy(0);
        let high = strategy(5);

        let collection = StrategyCollection::single(first.clone()).added(second.clone()).added(high.clone());
        let ids = collection.iter().map(|strategy| strategy.id()).collect::<Vec<_>>();

        assert_eq!(ids, [high.id(), first.id(), second.id()]);
    }

    #[test]
    fn test_removed_keeps_snapshot() {
        let first = strategy(0);
        let second = strategy(0);
        let collection = StrategyCollection::single(first.clone()).added(second.clone());

        let removed = collection.removed(first.id()).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(removed.len(), 1);
        assert!(removed.removed(first.id()).is_none());
        assert!(removed.removed(second.id()).unwrap().is_empty());
    }
}
