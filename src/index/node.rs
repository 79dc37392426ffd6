//! Node - one B+-tree page and its text codec.
//!
//! A [`Node`] is the in-memory form of exactly one [`Page`]. Leaves pair
//! each key with a record locator; internal nodes pair each key with the
//! id of a child subtree.

use std::str::FromStr;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, NodeId, Result};
use crate::storage::Page;

/// Delimiter that terminates every field and pads the page tail.
const DELIM: u8 = b'#';

/// Terminator for each of the six page segments.
const SEGMENT_END: u8 = b'\n';

/// One B+-tree node.
///
/// # Page Layout
/// A node serializes into six line-terminated text segments. Fields within
/// the two list segments are each *terminated* (not separated) by `#`, and
/// the final segment pads the page to its exact size with `#` bytes:
/// ```text
/// <id>#
/// <parent>#          (-1 when this node is the root)
/// <0|1>#             (1 = leaf)
/// <key_0>#<key_1>#...#
/// <ptr_0>#<ptr_1>#...#
/// ###...#            (padding to PAGE_SIZE)
/// ```
/// This layout is byte-for-byte fixed; existing index files depend on it.
/// Keys therefore must not contain `#` or newline bytes.
///
/// # Key/pointer pairing
/// `ptrs[i]` belongs to `keys[i]`: a record locator in a leaf, a child id
/// in an internal node. Internal nodes that descend from a promoted root
/// carry one extra leading pointer (the implicit leftmost child link
/// created at root promotion), so `ptrs` may be one longer than `keys`.
/// Leaves always have equal lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// This node's id, which is also its page number.
    pub id: NodeId,
    /// Parent node id; `None` means this node is the root.
    pub parent: Option<NodeId>,
    /// Leaves hold record locators, internal nodes hold child ids.
    pub is_leaf: bool,
    /// Keys, strictly ascending within the node.
    pub keys: Vec<String>,
    /// Record locators (leaf) or child node ids (internal).
    pub ptrs: Vec<u32>,
}

impl Node {
    /// Create a fresh root-candidate: a parentless empty leaf.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            is_leaf: true,
            keys: Vec::new(),
            ptrs: Vec::new(),
        }
    }

    /// Count of leading entries whose key is `<=` the search key.
    ///
    /// This single rule serves two purposes: in a leaf it is the ascending
    /// insertion point, in an internal node it selects the child to
    /// descend into (`ptrs[slot]`). Equal keys count as "less than or
    /// equal", so a search for an existing routing key descends to the
    /// right of it. That tie-break is part of the on-disk tree's
    /// semantics and must not be changed.
    pub fn insertion_slot(&self, key: &str) -> usize {
        self.keys.iter().take_while(|k| k.as_str() <= key).count()
    }

    /// Serialize this node into one page.
    ///
    /// # Errors
    /// Returns `Error::PageOverflow` if the meaningful segments exceed the
    /// page. The degree formula keeps well-formed trees clear of this.
    pub fn encode(&self) -> Result<Page> {
        let parent = self.parent.map_or(-1, |p| p.0 as i64);
        let mut text = format!(
            "{}#\n{}#\n{}#\n",
            self.id.0, parent, self.is_leaf as u8
        );
        for key in &self.keys {
            text.push_str(key);
            text.push(DELIM as char);
        }
        text.push(SEGMENT_END as char);
        for ptr in &self.ptrs {
            text.push_str(&ptr.to_string());
            text.push(DELIM as char);
        }
        text.push(SEGMENT_END as char);

        // One byte is reserved for the final segment terminator.
        if text.len() > PAGE_SIZE - 1 {
            return Err(Error::PageOverflow(self.id.0));
        }

        let mut page = Page::new();
        let data = page.as_mut_slice();
        data[..text.len()].copy_from_slice(text.as_bytes());
        data[text.len()..PAGE_SIZE - 1].fill(DELIM);
        data[PAGE_SIZE - 1] = SEGMENT_END;
        Ok(page)
    }

    /// Deserialize a node from one page.
    ///
    /// A strict single pass over the five meaningful segments; the padding
    /// segment is ignored. Any structural defect is a hard
    /// `Error::MalformedPage`.
    pub fn decode(page: &Page) -> Result<Self> {
        let mut rest = page.as_slice();

        let id: u32 = parse_number(take_field(&mut rest, "id")?, "id")?;

        let parent: i64 = parse_number(take_field(&mut rest, "parent")?, "parent")?;
        let parent = match parent {
            -1 => None,
            p if (0..=u32::MAX as i64).contains(&p) => Some(NodeId(p as u32)),
            p => {
                return Err(Error::MalformedPage(format!("parent {} out of range", p)));
            }
        };

        let is_leaf = match take_field(&mut rest, "isLeaf")? {
            [b'0'] => false,
            [b'1'] => true,
            other => {
                return Err(Error::MalformedPage(format!(
                    "isLeaf field {:?} is not 0 or 1",
                    String::from_utf8_lossy(other)
                )));
            }
        };

        let mut keys = Vec::new();
        for raw in take_list(&mut rest, "key")? {
            keys.push(parse_text(raw, "key")?.to_string());
        }

        let mut ptrs = Vec::new();
        for raw in take_list(&mut rest, "ptr")? {
            ptrs.push(parse_number(raw, "ptr")?);
        }

        Ok(Self {
            id: NodeId(id),
            parent,
            is_leaf,
            keys,
            ptrs,
        })
    }
}

/// Consume one segment up to its line terminator.
fn take_segment<'a>(rest: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let pos = rest
        .iter()
        .position(|&b| b == SEGMENT_END)
        .ok_or_else(|| Error::MalformedPage(format!("{} segment is missing its terminator", what)))?;
    let segment = &rest[..pos];
    *rest = &rest[pos + 1..];
    Ok(segment)
}

/// Consume a list segment into its `#`-terminated fields.
fn take_list<'a>(rest: &mut &'a [u8], what: &str) -> Result<Vec<&'a [u8]>> {
    let segment = take_segment(rest, what)?;
    if segment.is_empty() {
        return Ok(Vec::new());
    }
    let mut fields: Vec<&[u8]> = segment.split(|&b| b == DELIM).collect();
    match fields.pop() {
        Some(tail) if tail.is_empty() => Ok(fields),
        _ => Err(Error::MalformedPage(format!(
            "{} segment has an unterminated field",
            what
        ))),
    }
}

/// Consume a segment that must hold exactly one field.
fn take_field<'a>(rest: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let fields = take_list(rest, what)?;
    match fields.as_slice() {
        [field] => Ok(*field),
        _ => Err(Error::MalformedPage(format!(
            "{} segment holds {} fields, expected 1",
            what,
            fields.len()
        ))),
    }
}

fn parse_text<'a>(raw: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(raw)
        .map_err(|_| Error::MalformedPage(format!("{} field is not valid UTF-8", what)))
}

fn parse_number<T: FromStr>(raw: &[u8], what: &str) -> Result<T> {
    parse_text(raw, what)?.parse().map_err(|_| {
        Error::MalformedPage(format!(
            "{} field {:?} is not numeric",
            what,
            String::from_utf8_lossy(raw)
        ))
    })
}
