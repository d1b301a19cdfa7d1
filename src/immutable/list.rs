use alloc::{sync::Arc, vec::Vec};
use core::fmt::{self, Debug, Formatter};

struct Node<T> {
    value: T,
    next: Option<Arc<Node<T>>>,
}

/// Persistent prepend-only singly linked list.
///
/// Iteration yields the most recently added element first.
pub struct ImmutableList<T> {
    head: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> Clone for ImmutableList<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for ImmutableList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ImmutableList<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
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

    /// Returns a new list with `value` in front of the current elements.
    #[inline]
    #[must_use]
    pub fn add(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Node {
                value,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// The most recently added element.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.head.as_deref().map(|node| &node.value)
    }

    /// Iterates in reverse insertion order.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> ListIter<'_, T> {
        ListIter {
            current: self.head.as_deref(),
        }
    }

    /// Iterates in insertion order.
    pub fn iter_from_end(&self) -> impl DoubleEndedIterator<Item = &T> {
        let mut items = Vec::with_capacity(self.len);
        items.extend(self.iter());
        items.into_iter().rev()
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Drop for ImmutableList<T> {
    fn drop(&mut self) {
        // Unlink uniquely owned nodes one by one, a recursive drop overflows on long lists
        let mut head = self.head.take();
        while let Some(node) = head {
            match Arc::try_unwrap(node) {
                Ok(mut node) => head = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T: Debug> Debug for ImmutableList<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for ImmutableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |list, value| list.add(value))
    }
}

pub struct ListIter<'a, T> {
    current: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for ListIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = node.next.as_deref();
        Some(&node.value)
    }
}
