use alloc::sync::Arc;
use arc_swap::ArcSwap;
use core::fmt::{self, Debug, Formatter};

use super::{ImmutableList, ImmutableTree};
use crate::errors::CollectionErrorKind;

/// Shared reference to an [`ImmutableTree`], updated with compare-and-swap.
///
/// Readers take a snapshot and never block. Writers rebuild from the latest
/// snapshot and retry until no other writer published in between.
pub struct SharedTree<K, V> {
    snap: ArcSwap<ImmutableTree<K, V>>,
}

impl<K, V> Default for SharedTree<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SharedTree<K, V> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(ImmutableTree::new()),
        }
    }

    /// Current version of the tree.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<ImmutableTree<K, V>> {
        self.snap.load_full()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }

    /// Applies `update` to the latest version until the result is published.
    ///
    /// `update` may run several times under contention and returns `None` to leave the tree as is.
    pub fn update<R>(&self, mut update: impl FnMut(&ImmutableTree<K, V>) -> Option<(ImmutableTree<K, V>, R)>) -> Option<R> {
        loop {
            let cur = self.snap.load_full();
            let (next, result) = update(&cur)?;

            let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                return Some(result);
            }
        }
    }

    /// Publishes an empty tree and returns the version it replaced.
    #[inline]
    pub fn thread_safe_empty(&self) -> Arc<ImmutableTree<K, V>> {
        self.snap.swap(Arc::new(ImmutableTree::new()))
    }
}

impl<K: Ord + Clone, V: Clone> SharedTree<K, V> {
    #[inline]
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.snap.load().get(key).cloned()
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.snap.load().contains_key(key)
    }

    /// # Errors
    /// Returns [`CollectionErrorKind::KeyAlreadyExists`] if the key is present in the latest version.
    pub fn thread_safe_add(&self, key: K, value: V) -> Result<(), CollectionErrorKind> {
        let mut err = None;
        self.update(|tree| match tree.try_add(key.clone(), value.clone()) {
            Ok(next) => Some((next, ())),
            Err(kind) => {
                err = Some(kind);
                None
            }
        });
        err.map_or(Ok(()), Err)
    }

    /// Returns the stored value for `key`, adding `value` if the key is absent.
    ///
    /// Concurrent callers racing on the same key all observe the value of the winner.
    pub fn get_or_add(&self, key: K, value: V) -> V {
        loop {
            let cur = self.snap.load_full();
            if let Some(existing) = cur.get(&key) {
                return existing.clone();
            }

            let Ok(next) = cur.try_add(key.clone(), value.clone()) else {
                continue;
            };
            let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                return value;
            }
        }
    }

    #[inline]
    pub fn thread_safe_update(&self, key: K, value: V) {
        self.update(|tree| Some((tree.insert_or_update(key.clone(), value.clone()), ())));
    }

    /// Merges `value` into the entry for `key`, see [`ImmutableTree::update_with`].
    #[inline]
    pub fn thread_safe_merge(&self, key: K, value: V, mut merge: impl FnMut(&V, V) -> V) {
        self.update(|tree| Some((tree.update_with(key.clone(), value.clone(), &mut merge), ())));
    }

    #[inline]
    pub fn thread_safe_remove(&self, key: &K) -> Option<V> {
        self.update(|tree| tree.remove(key))
    }
}

impl<K: Debug, V: Debug> Debug for SharedTree<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.snap.load(), f)
    }
}

/// Shared reference to an [`ImmutableList`], updated with compare-and-swap.
pub struct SharedList<T> {
    snap: ArcSwap<ImmutableList<T>>,
}

impl<T> Default for SharedList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedList<T> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(ImmutableList::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<ImmutableList<T>> {
        self.snap.load_full()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }

    /// Prepends `value`, retrying until no element added concurrently is lost.
    pub fn thread_safe_add(&self, value: T)
    where
        T: Clone,
    {
        loop {
            let cur = self.snap.load_full();
            let next = Arc::new(cur.add(value.clone()));

            let prev = self.snap.compare_and_swap(&cur, next);
            if Arc::ptr_eq(&prev, &cur) {
                return;
            }
        }
    }

    /// Atomically takes every element, leaving the list empty.
    #[inline]
    pub fn thread_safe_empty(&self) -> Arc<ImmutableList<T>> {
        self.snap.swap(Arc::new(ImmutableList::new()))
    }
}

impl<T: Debug> Debug for SharedList<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.snap.load(), f)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{SharedList, SharedTree};
    use crate::errors::CollectionErrorKind;

    use alloc::{sync::Arc, vec::Vec};
    use std::thread;

    #[test]
    fn test_concurrent_tree_add_loses_nothing() {
        let tree = Arc::new(SharedTree::<u32, u32>::new());

        let handles = (0..8)
            .map(|thread_index| {
                let tree = tree.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        let key = thread_index * 1000 + i;
                        tree.thread_safe_add(key, key).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = tree.snapshot();
        assert_eq!(snapshot.len(), 2000);
        for thread_index in 0..8 {
            for i in 0..250 {
                let key = thread_index * 1000 + i;
                assert_eq!(snapshot.get(&key), Some(&key));
            }
        }
    }

    #[test]
    fn test_concurrent_list_add_loses_nothing() {
        let list = Arc::new(SharedList::<u32>::new());

        let handles = (0..8)
            .map(|thread_index| {
                let list = list.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        list.thread_safe_add(thread_index * 1000 + i);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut items = list.thread_safe_empty().iter().copied().collect::<Vec<_>>();
        items.sort_unstable();
        let mut expected = (0..8).flat_map(|t| (0..500).map(move |i| t * 1000 + i)).collect::<Vec<_>>();
        expected.sort_unstable();

        assert_eq!(items, expected);
        assert!(list.is_empty());
    }

    #[test]
    fn test_tree_add_existing_and_get_or_add() {
        let tree = SharedTree::new();
        tree.thread_safe_add("a", 1).unwrap();

        assert_eq!(tree.thread_safe_add("a", 2), Err(CollectionErrorKind::KeyAlreadyExists));
        assert_eq!(tree.get_or_add("a", 3), 1);
        assert_eq!(tree.get_or_add("b", 4), 4);
        assert_eq!(tree.thread_safe_remove(&"a"), Some(1));
        assert_eq!(tree.thread_safe_remove(&"a"), None);
        assert_eq!(tree.len(), 1);
    }
}
