//! Tree - one persistent B+-tree index.
//!
//! A [`Tree`] owns the id space and root of one named index and runs every
//! find/insert against the shared [`PageStore`], one node read or write at
//! a time. Nothing is cached: every descent re-reads its path from disk,
//! root included.

use tracing::{debug, trace};

use crate::common::config::{ID_FIELD_WIDTH, PAGE_SIZE};
use crate::common::{Error, NodeId, Result};
use crate::index::node::Node;
use crate::storage::SharedPageStore;

/// Suffix of every index backing file.
const FILE_SUFFIX: &str = ".index";

/// One disk-resident B+-tree, keyed by string attribute values.
///
/// # Disk protocol
/// Node `N` occupies page `N` of `<name>.index`. `size` counts nodes ever
/// allocated and doubles as the next free id; ids are never reused
/// (deletion is not supported). The root moves only when it splits.
///
/// # Failure model
/// A split persists its halves and parent as separate page writes. If one
/// of those writes fails, the tree on disk is left inconsistent; there is
/// no write-ahead protection. Callers that need crash safety must layer it
/// above this type.
pub struct Tree {
    name: String,
    /// Max entries a node may hold before it must split.
    degree: usize,
    /// Nodes ever allocated; also the next free node id.
    size: u32,
    root: NodeId,
    store: SharedPageStore,
}

impl Tree {
    /// Open an index, creating its backing file if it does not exist.
    ///
    /// `attribute_width` is the byte width of the indexed attribute; the
    /// node capacity is derived from it once:
    /// `degree = (PAGE_SIZE − 2×ID_FIELD_WIDTH) / (attribute_width + ID_FIELD_WIDTH) − 1`.
    ///
    /// An existing file is replayed page by page to recount `size` and
    /// locate the node without a parent as the root. A fresh index starts
    /// as a single empty leaf-root with id 0.
    ///
    /// # Panics
    /// Panics if `attribute_width` is so large that fewer than two entries
    /// fit per node.
    pub fn open(store: SharedPageStore, name: &str, attribute_width: usize) -> Result<Self> {
        let degree = ((PAGE_SIZE - 2 * ID_FIELD_WIDTH) / (attribute_width + ID_FIELD_WIDTH))
            .saturating_sub(1);
        assert!(
            degree >= 2,
            "attribute width {} leaves no room for node entries",
            attribute_width
        );

        let mut tree = Self {
            name: name.to_string(),
            degree,
            size: 0,
            root: NodeId(0),
            store,
        };

        let file = tree.file_name();
        let existing = {
            let store = tree.store.lock();
            if store.exists(&file) {
                let pages = store.page_count(&file)?;
                let mut root = NodeId(0);
                for page_no in 0..pages {
                    let node = Node::decode(&store.read_page(&file, page_no)?)?;
                    if node.parent.is_none() {
                        root = node.id;
                    }
                }
                Some((pages, root))
            } else {
                None
            }
        };

        match existing {
            Some((pages, root)) => {
                tree.size = pages;
                tree.root = root;
                debug!(name, degree, size = pages, root = root.0, "opened index");
            }
            None => {
                tree.size = 1;
                tree.write_node(&Node::new(NodeId(0)))?;
                debug!(name, degree, "created index");
            }
        }
        Ok(tree)
    }

    /// The backing file name: `<name>.index`.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, FILE_SUFFIX)
    }

    /// Max entries per node before a split is required.
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Nodes ever allocated.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Id of the current root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up the record locator stored under an exact key.
    ///
    /// Descends from the root, choosing `ptrs[slot]` at each internal
    /// node, then linear-scans the target leaf.
    ///
    /// # Errors
    /// `Error::KeyNotFound` if the leaf holds no exact match.
    pub fn find(&self, key: &str) -> Result<u32> {
        let leaf = self.descend(key)?;
        for (k, &ptr) in leaf.keys.iter().zip(&leaf.ptrs) {
            if k == key {
                return Ok(ptr);
            }
        }
        Err(Error::KeyNotFound(key.to_string()))
    }

    /// Insert a (key, record locator) entry.
    ///
    /// Duplicate keys are permitted and inserted in order; nothing is
    /// overwritten. Splits propagate upward as far as needed, growing a
    /// new root when the old one overflows.
    pub fn insert(&mut self, key: &str, value: u32) -> Result<()> {
        let mut leaf = self.descend(key)?;
        let slot = leaf.insertion_slot(key);
        leaf.keys.insert(slot, key.to_string());
        leaf.ptrs.insert(slot, value);
        trace!(name = %self.name, key, value, leaf = leaf.id.0, slot, "inserted entry");
        self.rebalance(leaf)
    }

    /// Walk from the root to the leaf responsible for `key`.
    fn descend(&self, key: &str) -> Result<Node> {
        let mut node = self.read_node(self.root)?;
        while !node.is_leaf {
            let slot = node.insertion_slot(key);
            node = self.read_node(NodeId(node.ptrs[slot]))?;
        }
        Ok(node)
    }

    /// Split overflowing nodes, walking up the tree.
    ///
    /// Each pass either persists an under-capacity node and stops, or
    /// halves the node into a new sibling and continues with the parent,
    /// fabricating a fresh root when the overflowing node was the root.
    /// The loop is bounded by the tree height plus one promotion.
    fn rebalance(&mut self, mut node: Node) -> Result<()> {
        loop {
            if node.keys.len() < self.degree {
                return self.write_node(&node);
            }

            let mut sibling = Node::new(self.allocate());
            sibling.is_leaf = node.is_leaf;
            sibling.parent = node.parent;

            let mid = node.keys.len() / 2;
            sibling.keys = node.keys.split_off(mid);
            sibling.ptrs = node.ptrs.split_off(mid);
            debug!(
                name = %self.name,
                node = node.id.0,
                sibling = sibling.id.0,
                moved = sibling.keys.len(),
                "split node"
            );

            let mut parent = match node.parent {
                None => {
                    // The root itself overflowed: promote a new internal
                    // root whose single initial pointer is the old root.
                    let mut root = Node::new(self.allocate());
                    root.is_leaf = false;
                    root.ptrs.push(node.id.0);
                    node.parent = Some(root.id);
                    sibling.parent = Some(root.id);
                    self.root = root.id;
                    debug!(name = %self.name, root = root.id.0, "promoted new root");
                    root
                }
                Some(parent_id) => self.read_node(parent_id)?,
            };

            // Route the sibling immediately to the right of the entry that
            // used to cover its range.
            let slot = parent.insertion_slot(&node.keys[0]);
            parent.keys.insert(slot, sibling.keys[0].clone());
            parent.ptrs.insert(slot + 1, sibling.id.0);

            self.write_node(&node)?;
            self.write_node(&sibling)?;

            node = parent;
        }
    }

    /// Hand out the next free node id.
    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.size);
        self.size += 1;
        id
    }

    fn read_node(&self, id: NodeId) -> Result<Node> {
        let page = self.store.lock().read_page(&self.file_name(), id.0)?;
        Node::decode(&page)
    }

    fn write_node(&self, node: &Node) -> Result<()> {
        let page = node.encode()?;
        self.store.lock().write_page(&self.file_name(), node.id.0, &page)
    }

    /// Delete the backing file. Consumes the tree; the id space and root
    /// are gone with the file.
    pub fn destroy(self) -> Result<()> {
        debug!(name = %self.name, "destroying index");
        self.store.lock().delete(&self.file_name())
    }

    /// Read every node of the tree, in id order.
    ///
    /// Test and inspection helper; the algorithms above never need a full
    /// scan outside `open`.
    pub fn nodes(&self) -> Result<Vec<Node>> {
        (0..self.size).map(|n| self.read_node(NodeId(n))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PageStore;
    use tempfile::tempdir;

    /// Width chosen so the degree formula yields exactly 3:
    /// (4096 - 20) / (1009 + 10) - 1 == 3.
    const DEGREE_3_WIDTH: usize = 1009;

    fn open_tree(dir: &std::path::Path, name: &str) -> Tree {
        Tree::open(PageStore::shared(dir), name, DEGREE_3_WIDTH).unwrap()
    }

    #[test]
    fn test_degree_formula() {
        let dir = tempdir().unwrap();
        let tree = open_tree(dir.path(), "t");
        assert_eq!(tree.degree(), 3);

        let wide = Tree::open(PageStore::shared(dir.path()), "w", 100).unwrap();
        assert_eq!(wide.degree(), (4096 - 20) / 110 - 1);
    }

    #[test]
    fn test_fresh_tree_is_single_empty_root() {
        let dir = tempdir().unwrap();
        let tree = open_tree(dir.path(), "t");

        assert_eq!(tree.size(), 1);
        assert_eq!(tree.root(), NodeId(0));

        let root = tree.read_node(tree.root()).unwrap();
        assert!(root.is_leaf);
        assert!(root.parent.is_none());
        assert!(root.keys.is_empty());
    }

    #[test]
    fn test_find_on_empty_tree() {
        let dir = tempdir().unwrap();
        let tree = open_tree(dir.path(), "t");
        assert!(matches!(tree.find("a"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_insert_and_find_without_split() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path(), "t");

        tree.insert("b", 1).unwrap();
        tree.insert("a", 2).unwrap();

        assert_eq!(tree.find("a").unwrap(), 2);
        assert_eq!(tree.find("b").unwrap(), 1);
        assert_eq!(tree.size(), 1); // no split yet
    }

    #[test]
    fn test_degree_3_split_and_lookup() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path(), "t");

        for (key, value) in [("b", 2), ("a", 1), ("d", 4), ("c", 3), ("e", 5)] {
            tree.insert(key, value).unwrap();
        }

        // Three entries in one leaf force at least one split.
        assert!(tree.size() > 1);
        assert_ne!(tree.root(), NodeId(0));

        assert_eq!(tree.find("a").unwrap(), 1);
        assert_eq!(tree.find("e").unwrap(), 5);
        assert!(matches!(tree.find("z"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_root_promotion_shape() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path(), "t");

        tree.insert("a", 1).unwrap();
        tree.insert("b", 2).unwrap();
        tree.insert("c", 3).unwrap();

        // First overflow: leaf 0 split into sibling 1 under new root 2.
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.root(), NodeId(2));

        let root = tree.read_node(tree.root()).unwrap();
        assert!(!root.is_leaf);
        assert_eq!(root.keys, vec!["b".to_string()]);
        assert_eq!(root.ptrs, vec![0, 1]);

        let left = tree.read_node(NodeId(0)).unwrap();
        let right = tree.read_node(NodeId(1)).unwrap();
        assert_eq!(left.keys, vec!["a".to_string()]);
        assert_eq!(right.keys, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(left.parent, Some(NodeId(2)));
        assert_eq!(right.parent, Some(NodeId(2)));
    }

    #[test]
    fn test_ordering_invariant_after_inserts() {
        let dir = tempdir().unwrap();
        let mut tree = Tree::open(PageStore::shared(dir.path()), "t", 100).unwrap();

        // Shuffled-ish insert order, enough volume for several leaf splits.
        for i in 0u32..100 {
            let key = format!("k{:03}", (i * 37) % 100);
            tree.insert(&key, i).unwrap();
        }

        for node in tree.nodes().unwrap() {
            assert!(
                node.keys.windows(2).all(|w| w[0] <= w[1]),
                "keys out of order in {}",
                node.id
            );
            if node.is_leaf {
                assert_eq!(node.keys.len(), node.ptrs.len());
            } else {
                // Promoted roots carry the implicit leftmost child link.
                assert_eq!(node.ptrs.len(), node.keys.len() + 1);
            }
        }
    }

    #[test]
    fn test_all_inserted_keys_remain_reachable() {
        let dir = tempdir().unwrap();
        let mut tree = Tree::open(PageStore::shared(dir.path()), "t", 100).unwrap();

        // Ascending inserts split the rightmost leaf repeatedly; every key
        // must stay reachable from the (moving) root.
        let keys: Vec<String> = (0..200).map(|i| format!("k{:03}", i)).collect();
        for (i, key) in keys.iter().enumerate() {
            tree.insert(key, i as u32).unwrap();
        }
        assert!(tree.size() > 3, "expected splits to have occurred");

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(tree.find(key).unwrap(), i as u32, "lost {}", key);
        }
    }

    #[test]
    fn test_duplicate_keys_both_inserted() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path(), "t");

        tree.insert("dup", 1).unwrap();
        tree.insert("dup", 2).unwrap();

        let found = tree.find("dup").unwrap();
        assert!(found == 1 || found == 2);

        // Both entries exist somewhere in the leaves.
        let count: usize = tree
            .nodes()
            .unwrap()
            .iter()
            .filter(|n| n.is_leaf)
            .map(|n| n.keys.iter().filter(|k| k.as_str() == "dup").count())
            .sum();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_reopen_replays_size_and_root() {
        let dir = tempdir().unwrap();

        let (size, root) = {
            let mut tree = open_tree(dir.path(), "t");
            for (i, key) in ["b", "a", "d", "c", "e"].iter().enumerate() {
                tree.insert(key, i as u32).unwrap();
            }
            (tree.size(), tree.root())
        };

        let tree = open_tree(dir.path(), "t");
        assert_eq!(tree.size(), size);
        assert_eq!(tree.root(), root);
        assert_eq!(tree.find("c").unwrap(), 3);
    }

    #[test]
    fn test_destroy_removes_file() {
        let dir = tempdir().unwrap();
        let store = PageStore::shared(dir.path());

        let tree = Tree::open(store.clone(), "t", DEGREE_3_WIDTH).unwrap();
        let file = tree.file_name();
        assert!(store.lock().exists(&file));

        tree.destroy().unwrap();
        assert!(!store.lock().exists(&file));
    }

    #[test]
    fn test_open_rejects_corrupt_page() {
        let dir = tempdir().unwrap();
        let store = PageStore::shared(dir.path());

        {
            let mut tree = Tree::open(store.clone(), "t", DEGREE_3_WIDTH).unwrap();
            tree.insert("a", 1).unwrap();
        }

        // Stomp the root page with bytes that decode cannot accept.
        let mut page = crate::storage::Page::new();
        page.as_mut_slice()[..4].copy_from_slice(b"????");
        store.lock().write_page("t.index", 0, &page).unwrap();

        match Tree::open(store, "t", DEGREE_3_WIDTH) {
            Err(Error::MalformedPage(_)) => {}
            other => panic!("expected MalformedPage, got {:?}", other.map(|_| ())),
        }
    }
}
