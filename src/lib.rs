//! pagetree - a disk-resident B+-tree index keyed by string attribute values.
//!
//! The indexing core of a small relational-database engine: each indexed
//! (table, attribute) pair gets its own tree, persisted as a flat file of
//! fixed-size pages, mapping string keys to integer record locators.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                    pagetree                       │
//! ├───────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────┐   │
//! │  │         Index Layer (index/)              │   │
//! │  │  IndexDirectory → Tree → Node (codec)     │   │
//! │  └───────────────────────────────────────────┘   │
//! │                       ↓                           │
//! │  ┌───────────────────────────────────────────┐   │
//! │  │        Storage Layer (storage/)           │   │
//! │  │   PageStore (shared, locked) + Page       │   │
//! │  └───────────────────────────────────────────┘   │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`storage`] - Page buffers and per-file page I/O
//! - [`index`] - Node codec, tree algorithms, index directory
//!
//! # Quick Start
//! ```no_run
//! use pagetree::IndexDirectory;
//!
//! let mut im = IndexDirectory::new("indexes");
//! im.select_workspace("student", "sname");
//! im.create_index(100).unwrap();
//! im.insert("alice", 42).unwrap();
//! assert_eq!(im.find("alice").unwrap(), 42);
//! ```
//!
//! # Concurrency
//! Operations are synchronous and must run sequentially. The single
//! [`storage::PageStore`] is shared by every tree behind a lock, so
//! interleaved calls cannot corrupt each other's I/O, but the library
//! offers no finer-grained concurrency than that.

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, NodeId, Result};

pub use index::{IndexDirectory, Node, Tree};
pub use storage::{Page, PageStore, SharedPageStore};
