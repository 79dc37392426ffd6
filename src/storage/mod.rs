//! Storage layer - page buffers and per-file page I/O.
//!
//! This module handles persistent storage:
//! - [`Page`] - The fixed-size unit of I/O
//! - [`PageStore`] - Page-granular file access shared by every tree

mod page;
mod page_store;

pub use page::Page;
pub use page_store::{PageStore, SharedPageStore};
