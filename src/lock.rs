use alloc::sync::Arc;
use parking_lot::ReentrantMutex;

use crate::immutable::SharedTree;

/// Materialization guards, one per cache key.
///
/// Locks are reentrant so that a self-dependent activation on the same thread runs into the
/// resolve depth limit instead of deadlocking.
pub(crate) struct KeyedLocks<K> {
    locks: SharedTree<K, Arc<ReentrantMutex<()>>>,
}

impl<K> Default for KeyedLocks<K> {
    #[inline]
    fn default() -> Self {
        Self { locks: SharedTree::new() }
    }
}

impl<K: Ord + Clone> KeyedLocks<K> {
    #[must_use]
    pub(crate) fn get(&self, key: &K) -> Arc<ReentrantMutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return lock;
        }
        self.locks.get_or_add(key.clone(), Arc::new(ReentrantMutex::new(())))
    }

    /// Forgets the lock of a key that won't be materialized again.
    #[inline]
    pub(crate) fn release(&self, key: &K) {
        self.locks.thread_safe_remove(key);
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::KeyedLocks;

    use alloc::sync::Arc;

    #[test]
    fn test_same_key_same_lock() {
        let locks = KeyedLocks::<u8>::default();

        assert!(Arc::ptr_eq(&locks.get(&1), &locks.get(&1)));
        assert!(!Arc::ptr_eq(&locks.get(&1), &locks.get(&2)));

        locks.release(&1);
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_reentrant() {
        let locks = KeyedLocks::<u8>::default();
        let lock = locks.get(&1);

        let _outer = lock.lock();
        let _inner = lock.lock();
    }
}
