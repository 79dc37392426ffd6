//! Node identifier type.
//!
//! A node's id doubles as its page number: node `N` lives at byte offset
//! `N × PAGE_SIZE` of the index file. This direct addressing is a file
//! format invariant; do not introduce indirection that breaks it.

use std::fmt;

use crate::common::config::PAGE_SIZE;

/// Identifies one B+-tree node, and therefore one page of its index file.
///
/// Ids are allocated densely starting from 0 (the initial root) and are
/// stable for the node's lifetime.
///
/// # Example
/// ```
/// use pagetree::NodeId;
///
/// let id = NodeId::new(3);
/// assert_eq!(id.0, 3);
/// assert_eq!(id.offset(), 3 * 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Byte offset of this node's page within its index file.
    #[inline]
    pub fn offset(&self) -> u64 {
        (self.0 as u64) * (PAGE_SIZE as u64)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}
