//! Page Store - page-granular file I/O for index files.
//!
//! The [`PageStore`] handles all direct file operations:
//! - Reading and writing pages of named index files
//! - Existence checks and deletion
//! - Reporting a file's page count for sequential replay

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::page::Page;

/// The single page store handle shared by every tree.
///
/// The store is one process-wide resource; wrapping it in a lock makes the
/// required serialization explicit instead of relying on callers never to
/// interleave operations.
pub type SharedPageStore = Arc<Mutex<PageStore>>;

/// Manages page I/O for the index files of one working directory.
///
/// # File Layout
/// Each index file is a flat concatenation of fixed-size pages:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096    ...   N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`, and always holds the
/// node whose id is N.
///
/// # Statelessness
/// Every call names its file and page explicitly; no current-file or
/// current-offset state survives between calls. Files are opened per
/// operation, so a store can serve any number of index files.
///
/// # Durability
/// All writes are followed by `fsync()` to ensure durability.
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    /// Create a store over a working directory.
    ///
    /// The directory must already exist; every index file is addressed
    /// relative to it.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store and wrap it in the shared handle trees expect.
    pub fn shared<P: Into<PathBuf>>(dir: P) -> SharedPageStore {
        Arc::new(Mutex::new(Self::new(dir)))
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Check whether an index file exists.
    pub fn exists(&self, file: &str) -> bool {
        self.path(file).exists()
    }

    /// Number of pages in an index file.
    ///
    /// A trailing partial page (which only a crash or foreign writer can
    /// produce) is not counted.
    pub fn page_count(&self, file: &str) -> Result<u32> {
        let len = fs::metadata(self.path(file))?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Read one page from an index file.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if `page_no` lies beyond the file's
    /// last full page.
    pub fn read_page(&self, file: &str, page_no: u32) -> Result<Page> {
        if page_no >= self.page_count(file)? {
            return Err(Error::PageNotFound(page_no));
        }

        let mut f = OpenOptions::new().read(true).open(self.path(file))?;
        f.seek(SeekFrom::Start((page_no as u64) * (PAGE_SIZE as u64)))?;

        let mut page = Page::new();
        f.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    /// Write one page to an index file, creating the file if needed.
    ///
    /// # Durability
    /// Calls `fsync()` after writing so the page is persisted before the
    /// caller proceeds.
    pub fn write_page(&self, file: &str, page_no: u32, page: &Page) -> Result<()> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(self.path(file))?;

        f.seek(SeekFrom::Start((page_no as u64) * (PAGE_SIZE as u64)))?;
        f.write_all(page.as_slice())?;
        f.sync_all()?;

        Ok(())
    }

    /// Delete an index file.
    pub fn delete(&self, file: &str) -> Result<()> {
        fs::remove_file(self.path(file))?;
        Ok(())
    }

    /// The store's working directory.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
