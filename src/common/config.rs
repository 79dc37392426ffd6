//! Configuration constants for pagetree.

/// Size of a page in bytes (4KB).
///
/// Every node serializes into exactly one page, and page `i` of an index
/// file always holds node `i`. The file format depends on this value:
/// changing it makes existing `.index` files unreadable.
pub const PAGE_SIZE: usize = 4096;

/// Bytes budgeted per node id / record locator in the page text encoding.
///
/// Node ids and record locators are written as decimal text, so this is the
/// widest such field the degree formula accounts for. Used only to derive a
/// tree's degree; see [`crate::index::Tree::open`].
pub const ID_FIELD_WIDTH: usize = 10;
