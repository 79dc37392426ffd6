//! Index layer - B+-tree nodes, trees, and the named-index directory.
//!
//! - [`Node`] - One tree page and its text codec
//! - [`Tree`] - One persistent index: open/find/insert/split/destroy
//! - [`IndexDirectory`] - Workspace-keyed registry of live trees

mod directory;
mod node;
mod tree;

pub use directory::IndexDirectory;
pub use node::Node;
pub use tree::Tree;
