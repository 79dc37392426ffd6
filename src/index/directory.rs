//! Index Directory - the registry of named trees.
//!
//! An [`IndexDirectory`] maps a workspace key - `table#attribute` - to a
//! live [`Tree`]. Every operation is scoped to the workspace selected
//! beforehand with [`IndexDirectory::select_workspace`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::common::{Error, Result};
use crate::index::tree::Tree;
use crate::storage::{PageStore, SharedPageStore};

/// Directory of named B+-tree indexes over one working directory.
///
/// All trees share the directory's single [`PageStore`] handle. No two
/// live trees may share a workspace key; dropping a tree frees its key
/// for re-creation.
///
/// # Preconditions
/// [`drop_index`](Self::drop_index), [`find`](Self::find) and
/// [`insert`](Self::insert) require that an index was created on the
/// current workspace; they panic otherwise. This mirrors the record
/// manager's calling discipline rather than guarding with an error.
pub struct IndexDirectory {
    store: SharedPageStore,
    trees: HashMap<String, Tree>,
    workspace: String,
}

impl IndexDirectory {
    /// Create a directory whose index files live under `dir`.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            store: PageStore::shared(dir),
            trees: HashMap::new(),
            workspace: String::new(),
        }
    }

    /// Point subsequent operations at the index of one (table, attribute)
    /// pair. Pure state mutation, no I/O.
    pub fn select_workspace(&mut self, table: &str, attribute: &str) {
        self.workspace = format!("{}#{}", table, attribute);
    }

    /// The current workspace key.
    #[inline]
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Create (or reopen from disk) the index for the current workspace.
    ///
    /// `attribute_width` is the byte width of the indexed attribute and
    /// fixes the tree's degree.
    ///
    /// # Errors
    /// `Error::IndexAlreadyExists` if a live tree is already bound to the
    /// workspace key; no state is created in that case.
    pub fn create_index(&mut self, attribute_width: usize) -> Result<()> {
        if self.trees.contains_key(&self.workspace) {
            return Err(Error::IndexAlreadyExists(self.workspace.clone()));
        }
        debug!(workspace = %self.workspace, attribute_width, "creating index");
        let tree = Tree::open(Arc::clone(&self.store), &self.workspace, attribute_width)?;
        self.trees.insert(self.workspace.clone(), tree);
        Ok(())
    }

    /// Destroy the current workspace's index and unregister it.
    ///
    /// # Panics
    /// Panics if no index was created on the current workspace.
    pub fn drop_index(&mut self) -> Result<()> {
        debug!(workspace = %self.workspace, "dropping index");
        let tree = self
            .trees
            .remove(&self.workspace)
            .expect("no index created on the current workspace");
        tree.destroy()
    }

    /// Look up a key in the current workspace's index.
    ///
    /// # Panics
    /// Panics if no index was created on the current workspace.
    pub fn find(&self, key: &str) -> Result<u32> {
        self.current().find(key)
    }

    /// Insert a (key, record locator) entry into the current workspace's
    /// index.
    ///
    /// # Panics
    /// Panics if no index was created on the current workspace.
    pub fn insert(&mut self, key: &str, value: u32) -> Result<()> {
        self.trees
            .get_mut(&self.workspace)
            .expect("no index created on the current workspace")
            .insert(key, value)
    }

    fn current(&self) -> &Tree {
        self.trees
            .get(&self.workspace)
            .expect("no index created on the current workspace")
    }
}
