use alloc::{sync::Arc, vec::Vec};
use core::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::{self, Debug, Formatter},
};

use crate::errors::CollectionErrorKind;

type Link<K, V> = Option<Arc<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    height: u8,
    left: Link<K, V>,
    right: Link<K, V>,
}

#[inline]
fn height<K, V>(link: &Link<K, V>) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

#[inline]
fn make<K, V>(key: K, value: V, left: Link<K, V>, right: Link<K, V>) -> Arc<Node<K, V>> {
    let height = height(&left).max(height(&right)) + 1;
    Arc::new(Node {
        key,
        value,
        height,
        left,
        right,
    })
}

fn rotate_right<K: Clone, V: Clone>(key: K, value: V, left: Arc<Node<K, V>>, right: Link<K, V>) -> Arc<Node<K, V>> {
    let pivot_right = make(key, value, left.right.clone(), right);
    make(left.key.clone(), left.value.clone(), left.left.clone(), Some(pivot_right))
}

fn rotate_left<K: Clone, V: Clone>(key: K, value: V, left: Link<K, V>, right: Arc<Node<K, V>>) -> Arc<Node<K, V>> {
    let pivot_left = make(key, value, left, right.left.clone());
    make(right.key.clone(), right.value.clone(), Some(pivot_left), right.right.clone())
}

/// Builds a node from parts, restoring the AVL balance if needed.
fn balance<K: Clone, V: Clone>(key: K, value: V, left: Link<K, V>, right: Link<K, V>) -> Arc<Node<K, V>> {
    let (left_height, right_height) = (height(&left), height(&right));

    if left_height > right_height + 1 {
        let Some(left) = left else { unreachable!("left subtree is higher, so it exists") };
        if height(&left.left) >= height(&left.right) {
            return rotate_right(key, value, left, right);
        }
        let Some(inner) = left.right.clone() else { unreachable!("left-right subtree is higher, so it exists") };
        let left = rotate_left(left.key.clone(), left.value.clone(), left.left.clone(), inner);
        return rotate_right(key, value, left, right);
    }
    if right_height > left_height + 1 {
        let Some(right) = right else { unreachable!("right subtree is higher, so it exists") };
        if height(&right.right) >= height(&right.left) {
            return rotate_left(key, value, left, right);
        }
        let Some(inner) = right.left.clone() else { unreachable!("right-left subtree is higher, so it exists") };
        let right = rotate_right(right.key.clone(), right.value.clone(), inner, right.right.clone());
        return rotate_left(key, value, left, right);
    }

    make(key, value, left, right)
}

fn put<K, V, F>(link: &Link<K, V>, key: K, value: V, on_existing: &mut F) -> Result<(Arc<Node<K, V>>, bool), CollectionErrorKind>
where
    K: Ord + Clone,
    V: Clone,
    F: FnMut(&V, V) -> Result<V, CollectionErrorKind>,
{
    let Some(node) = link else {
        return Ok((make(key, value, None, None), true));
    };

    match key.cmp(&node.key) {
        Ordering::Less => {
            let (left, added) = put(&node.left, key, value, on_existing)?;
            Ok((balance(node.key.clone(), node.value.clone(), Some(left), node.right.clone()), added))
        }
        Ordering::Greater => {
            let (right, added) = put(&node.right, key, value, on_existing)?;
            Ok((balance(node.key.clone(), node.value.clone(), node.left.clone(), Some(right)), added))
        }
        Ordering::Equal => {
            let value = on_existing(&node.value, value)?;
            Ok((
                Arc::new(Node {
                    key,
                    value,
                    height: node.height,
                    left: node.left.clone(),
                    right: node.right.clone(),
                }),
                false,
            ))
        }
    }
}

/// Removes the minimum of a non-empty subtree, returning it and the remaining subtree.
fn take_min<K: Clone, V: Clone>(node: &Arc<Node<K, V>>) -> ((K, V), Link<K, V>) {
    match &node.left {
        None => ((node.key.clone(), node.value.clone()), node.right.clone()),
        Some(left) => {
            let (min, rest) = take_min(left);
            (min, Some(balance(node.key.clone(), node.value.clone(), rest, node.right.clone())))
        }
    }
}

fn delete<K: Ord + Clone, V: Clone>(link: &Link<K, V>, key: &K) -> Option<(Link<K, V>, V)> {
    let node = link.as_ref()?;

    match key.cmp(&node.key) {
        Ordering::Less => {
            let (left, removed) = delete(&node.left, key)?;
            Some((Some(balance(node.key.clone(), node.value.clone(), left, node.right.clone())), removed))
        }
        Ordering::Greater => {
            let (right, removed) = delete(&node.right, key)?;
            Some((Some(balance(node.key.clone(), node.value.clone(), node.left.clone(), right)), removed))
        }
        Ordering::Equal => {
            let removed = node.value.clone();
            let rest = match (&node.left, &node.right) {
                (None, None) => None,
                (Some(left), None) => Some(left.clone()),
                (None, Some(right)) => Some(right.clone()),
                (Some(_), Some(right)) => {
                    let ((min_key, min_value), right) = take_min(right);
                    Some(balance(min_key, min_value, node.left.clone(), right))
                }
            };
            Some((rest, removed))
        }
    }
}

/// Persistent AVL tree map.
///
/// Cloning is `O(1)`; every update is `O(log n)` and copies only the path from the root.
pub struct ImmutableTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Clone for ImmutableTree<K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<K, V> Default for ImmutableTree<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ImmutableTree<K, V> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u8 {
        height(&self.root)
    }

    /// In-order iterator over the entries.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> TreeIter<'_, K, V> {
        let mut iter = TreeIter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns `true` if both trees share the same root node.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<K: Ord, V> ImmutableTree<K, V> {
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K: Ord + Clone, V: Clone> ImmutableTree<K, V> {
    /// Returns a new tree with the entry added.
    ///
    /// # Errors
    /// Returns [`CollectionErrorKind::KeyAlreadyExists`] if the key is present.
    /// Use [`Self::insert_or_update`] to overwrite.
    pub fn try_add(&self, key: K, value: V) -> Result<Self, CollectionErrorKind> {
        self.put_with(key, value, |_, _| Err(CollectionErrorKind::KeyAlreadyExists))
    }

    /// Returns a new tree with the entry added or its value replaced.
    #[must_use]
    pub fn insert_or_update(&self, key: K, value: V) -> Self {
        match self.put_with(key, value, |_, new| Ok(new)) {
            Ok(tree) => tree,
            Err(_) => unreachable!("replacing collision handler never fails"),
        }
    }

    /// Returns a new tree with the entry added, or merged with the existing value by `merge(old, new)`.
    #[must_use]
    pub fn update_with(&self, key: K, value: V, mut merge: impl FnMut(&V, V) -> V) -> Self {
        match self.put_with(key, value, |old, new| Ok(merge(old, new))) {
            Ok(tree) => tree,
            Err(_) => unreachable!("merging collision handler never fails"),
        }
    }

    fn put_with<F>(&self, key: K, value: V, mut on_existing: F) -> Result<Self, CollectionErrorKind>
    where
        F: FnMut(&V, V) -> Result<V, CollectionErrorKind>,
    {
        let (root, added) = put(&self.root, key, value, &mut on_existing)?;
        Ok(Self {
            root: Some(root),
            len: if added { self.len + 1 } else { self.len },
        })
    }

    /// Returns a new tree without the key and the removed value, or `None` if the key is absent.
    #[must_use]
    pub fn remove(&self, key: &K) -> Option<(Self, V)> {
        let (root, removed) = delete(&self.root, key)?;
        Some((Self { root, len: self.len - 1 }, removed))
    }
}

impl<K: Debug, V: Debug> Debug for ImmutableTree<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for ImmutableTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |tree, (key, value)| tree.insert_or_update(key, value))
    }
}

pub struct TreeIter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> TreeIter<'a, K, V> {
    fn push_left(&mut self, mut node: Option<&'a Node<K, V>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for TreeIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::ImmutableTree;
    use crate::errors::CollectionErrorKind;

    use alloc::vec::Vec;

    #[test]
    fn test_add_keeps_previous_versions() {
        let empty = ImmutableTree::<u32, &str>::new();
        let one = empty.try_add(1, "one").unwrap();
        let two = one.try_add(2, "two").unwrap();

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(&2), None);
        assert_eq!(two.get(&1), Some(&"one"));
        assert_eq!(two.get(&2), Some(&"two"));
    }

    #[test]
    fn test_add_existing_key_fails_fast() {
        let tree = ImmutableTree::new().try_add(1, 10).unwrap();

        assert_eq!(tree.try_add(1, 20).unwrap_err(), CollectionErrorKind::KeyAlreadyExists);
        assert_eq!(tree.insert_or_update(1, 20).get(&1), Some(&20));
        assert_eq!(tree.update_with(1, 5, |old, new| old + new).get(&1), Some(&15));
        assert_eq!(tree.get(&1), Some(&10));
    }

    #[test]
    fn test_stays_balanced_and_ordered() {
        let tree: ImmutableTree<u32, u32> = (0..1024).map(|i| (i, i * 2)).collect();

        assert_eq!(tree.len(), 1024);
        assert!(tree.height() < 15);
        assert!(tree.keys().copied().eq(0..1024));
        assert_eq!(tree.get(&512), Some(&1024));
    }

    #[test]
    fn test_remove() {
        let tree: ImmutableTree<u32, u32> = (0..100).map(|i| (i, i)).collect();
        let mut current = tree.clone();
        for key in (0..100).step_by(3) {
            let (next, removed) = current.remove(&key).unwrap();
            assert_eq!(removed, key);
            current = next;
        }

        assert!(current.remove(&0).is_none());
        assert_eq!(current.len(), 66);
        assert_eq!(tree.len(), 100);
        assert!(current.height() <= 8);
        assert_eq!(
            current.keys().copied().collect::<Vec<_>>(),
            (0..100).filter(|key| key % 3 != 0).collect::<Vec<_>>()
        );
    }
}
