//! Ordered index structures over externally stored records.
//!
//! The caller owns the value container; this crate maintains sort order
//! over its integer slot indices without allocating per insert.

mod index;
mod skiplist;

pub use index::Index;
pub use skiplist::{Backwards, Forwards, SkipList};
