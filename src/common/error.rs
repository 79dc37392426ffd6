//! Error types for pagetree.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagetree.
///
/// A single error type keeps handling consistent across the storage and
/// index layers, and lets callers branch on kind rather than message text.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup found no exact match in the target leaf.
    #[error("key {0:?} not found")]
    KeyNotFound(String),

    /// `create_index` on a workspace that already has a live tree.
    #[error("index on {0:?} already exists")]
    IndexAlreadyExists(String),

    /// A page failed to decode into a node (corrupt or truncated).
    #[error("malformed page: {0}")]
    MalformedPage(String),

    /// Requested page lies beyond the end of the index file.
    #[error("page {0} not found")]
    PageNotFound(u32),

    /// A node's serialized form does not fit in one page.
    ///
    /// The degree formula makes this unreachable for keys within the
    /// declared attribute width; it fires when a caller inserts wider keys.
    #[error("node {0} does not fit in a page")]
    PageOverflow(u32),
}
