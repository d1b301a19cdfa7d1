//! Persistent collections used for every piece of mutable-looking container state.
//!
//! Values are never changed in place: an update builds a new version that shares
//! untouched nodes with the old one. [`SharedTree`] and [`SharedList`] publish new
//! versions with compare-and-swap, so readers never block and writers retry until
//! their version wins.

mod list;
mod shared;
mod tree;

pub use list::{ImmutableList, ListIter};
pub use shared::{SharedList, SharedTree};
pub use tree::{ImmutableTree, TreeIter};
