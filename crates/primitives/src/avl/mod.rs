//! AvlTree: persistent ordered dictionary
//!
//! ## Design
//!
//! A classic AVL tree whose nodes live in the byte store instead of the
//! heap. Nodes are addressed by [`NodeId`]s from an [`IndexAllocator`]; every
//! link, height, balance factor, payload and key component is a separate
//! field read and written through the node accessor. Nothing about the shape
//! of the tree is held in memory between calls, so a tree reopened on the same
//! store and namespace sees exactly the last completed field writes.
//!
//! Keys are fixed-arity tuples of strings. Each position has its own
//! [`KeyComparator`]; positions are compared left to right and the first
//! non-equal comparison decides.
//!
//! ## Rebalancing
//!
//! After any structural change the path from the changed node to the root is
//! walked. Each node gets its height and balance factor recomputed from the
//! stored heights of its children (-1 for an absent child). A balance factor
//! of -2 or +2 triggers a single or double rotation. The walk then continues
//! from the parent of the rotated subtree.
//!
//! ## Trust boundary
//!
//! The tree does not validate its own invariants at runtime. They hold as
//! long as this type is the only writer of its namespace and each call runs
//! to completion. A crash partway through a rotation can leave links
//! inconsistent; there is no redo log.
//!
//! ## Thread Safety
//!
//! Mutations take `&mut self`. Two `AvlTree` handles on the same namespace
//! are not coordinated, so callers must serialize them.

mod comparator;
mod node;

pub use comparator::{KeyComparator, KeyOrder, Lexicographic, NumericAscending, NumericDescending};

use crate::allocator::IndexAllocator;
use crate::field_store::FieldStore;
use chatkv_core::{Error, FileId, NodeId, Result};
use node::NodeStore;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::trace;

/// Direction of an in-order walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Ascending,
    Descending,
}

/// Persistent AVL dictionary bound to one namespace
pub struct AvlTree {
    ns: FileId,
    nodes: NodeStore,
    allocator: IndexAllocator,
    comparators: Vec<Box<dyn KeyComparator>>,
}

impl AvlTree {
    /// Open the tree stored under `ns`.
    ///
    /// The tree's key arity is `comparators.len()`. Node ids are drawn from
    /// an allocator in the same namespace.
    ///
    /// # Panics
    ///
    /// Panics if `comparators` is empty.
    pub fn new(
        fields: Arc<FieldStore>,
        ns: FileId,
        comparators: Vec<Box<dyn KeyComparator>>,
    ) -> Self {
        assert!(
            !comparators.is_empty(),
            "a tree needs at least one key comparator"
        );
        Self {
            ns,
            nodes: NodeStore::new(fields.clone(), ns),
            allocator: IndexAllocator::new(fields, ns),
            comparators,
        }
    }

    /// Open a tree with comparators chosen by name.
    pub fn with_orders(fields: Arc<FieldStore>, ns: FileId, orders: &[KeyOrder]) -> Self {
        Self::new(fields, ns, orders.iter().map(KeyOrder::comparator).collect())
    }

    /// Namespace the tree is stored under
    pub fn namespace(&self) -> FileId {
        self.ns
    }

    /// Number of components in every key
    pub fn arity(&self) -> usize {
        self.comparators.len()
    }

    /// Number of entries. Reads the persisted counter.
    pub fn size(&self) -> Result<u64> {
        self.nodes.size()
    }

    /// Check if the tree holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.nodes.root()?.is_none())
    }

    /// Height of the root node; -1 for an empty tree
    pub fn height(&self) -> Result<i32> {
        let root = self.nodes.root()?;
        self.nodes.height(root)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert `key` with payload `data`.
    ///
    /// If the key is already present only its payload is replaced; the shape
    /// of the tree and its size are unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `key.len()` differs from the tree's arity.
    pub fn insert<K: AsRef<str>>(&mut self, key: &[K], data: impl Into<String>) -> Result<()> {
        self.check_arity(key.len());
        let data = data.into();

        let Some(mut current) = self.nodes.root()? else {
            let id = self.allocator.allocate()?;
            self.nodes.create(id, key, &data, None)?;
            self.nodes.set_root(Some(id))?;
            return self.nodes.set_size(1);
        };

        let went_left = loop {
            let (next, went_left) = match self.compare_key(key, current)? {
                Ordering::Equal => return self.nodes.set_data(current, &data),
                Ordering::Less => (self.nodes.left(current)?, true),
                Ordering::Greater => (self.nodes.right(current)?, false),
            };
            match next {
                Some(child) => current = child,
                None => break went_left,
            }
        };

        let id = self.allocator.allocate()?;
        self.nodes.create(id, key, &data, Some(current))?;
        if went_left {
            self.nodes.set_left(current, Some(id))?;
        } else {
            self.nodes.set_right(current, Some(id))?;
        }
        let size = self.nodes.size()?;
        self.nodes.set_size(size + 1)?;

        self.rebalance_from(Some(current))
    }

    /// Remove `key`. Returns `false` if it was not present.
    ///
    /// A node with two children takes over its in-order successor's key and
    /// payload, and the successor is spliced out instead.
    ///
    /// # Panics
    ///
    /// Panics if `key.len()` differs from the tree's arity.
    pub fn delete<K: AsRef<str>>(&mut self, key: &[K]) -> Result<bool> {
        self.check_arity(key.len());

        let Some(target) = self.find(key)? else {
            return Ok(false);
        };

        let spliced = match (self.nodes.left(target)?, self.nodes.right(target)?) {
            (Some(_), Some(right)) => {
                let successor = self.leftmost(right)?;
                self.nodes.copy_entry(successor, target, self.arity())?;
                successor
            }
            _ => target,
        };
        self.splice(spliced)?;

        let size = self.nodes.size()?;
        self.nodes.set_size(size.saturating_sub(1))?;
        Ok(true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Payload stored under `key`, if any.
    pub fn get<K: AsRef<str>>(&self, key: &[K]) -> Result<Option<String>> {
        self.check_arity(key.len());
        match self.find(key)? {
            Some(id) => self.nodes.data(id).map(Some),
            None => Ok(None),
        }
    }

    /// Check if `key` is present.
    pub fn contains_key<K: AsRef<str>>(&self, key: &[K]) -> Result<bool> {
        self.check_arity(key.len());
        Ok(self.find(key)?.is_some())
    }

    /// Every key component of every entry, flattened, in ascending key order.
    ///
    /// A tree of arity 2 holding `(a, 1)` and `(b, 2)` yields
    /// `["a", "1", "b", "2"]`.
    pub fn get_all_keys_in_order(&self) -> Result<Vec<String>> {
        let arity = self.arity();
        let mut out = Vec::new();
        self.walk(Walk::Ascending, |id| {
            out.extend(self.nodes.key(id, arity)?);
            Ok(true)
        })?;
        Ok(out)
    }

    /// Every `(key, payload)` pair in ascending key order.
    pub fn entries_in_order(&self) -> Result<Vec<(Vec<String>, String)>> {
        let arity = self.arity();
        let mut out = Vec::new();
        self.walk(Walk::Ascending, |id| {
            out.push((self.nodes.key(id, arity)?, self.nodes.data(id)?));
            Ok(true)
        })?;
        Ok(out)
    }

    /// Payloads of the `n` greatest keys, greatest first.
    ///
    /// Returns fewer than `n` items when the tree is smaller.
    pub fn top_n_descending(&self, n: usize) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(n.min(1024));
        if n == 0 {
            return Ok(out);
        }
        self.walk(Walk::Descending, |id| {
            out.push(self.nodes.data(id)?);
            Ok(out.len() < n)
        })?;
        Ok(out)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_arity(&self, len: usize) {
        assert_eq!(
            len,
            self.arity(),
            "key arity mismatch for tree {}",
            self.ns
        );
    }

    fn compare_key<K: AsRef<str>>(&self, key: &[K], id: NodeId) -> Result<Ordering> {
        for (i, (component, comparator)) in key.iter().zip(&self.comparators).enumerate() {
            let stored = self.nodes.key_component(id, i)?;
            match comparator.compare(component.as_ref(), &stored) {
                Ordering::Equal => continue,
                other => return Ok(other),
            }
        }
        Ok(Ordering::Equal)
    }

    fn find<K: AsRef<str>>(&self, key: &[K]) -> Result<Option<NodeId>> {
        let mut current = self.nodes.root()?;
        while let Some(id) = current {
            current = match self.compare_key(key, id)? {
                Ordering::Equal => return Ok(Some(id)),
                Ordering::Less => self.nodes.left(id)?,
                Ordering::Greater => self.nodes.right(id)?,
            };
        }
        Ok(None)
    }

    fn leftmost(&self, mut id: NodeId) -> Result<NodeId> {
        while let Some(left) = self.nodes.left(id)? {
            id = left;
        }
        Ok(id)
    }

    /// Visit nodes in key order until `visit` returns `false`.
    fn walk<F>(&self, direction: Walk, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeId) -> Result<bool>,
    {
        let near = |id| match direction {
            Walk::Ascending => self.nodes.left(id),
            Walk::Descending => self.nodes.right(id),
        };
        let far = |id| match direction {
            Walk::Ascending => self.nodes.right(id),
            Walk::Descending => self.nodes.left(id),
        };

        let mut stack = Vec::new();
        let mut current = self.nodes.root()?;
        loop {
            while let Some(id) = current {
                stack.push(id);
                current = near(id)?;
            }
            let Some(id) = stack.pop() else {
                return Ok(());
            };
            if !visit(id)? {
                return Ok(());
            }
            current = far(id)?;
        }
    }

    /// Unlink a node with at most one child and free its id.
    fn splice(&mut self, id: NodeId) -> Result<()> {
        let child = match self.nodes.left(id)? {
            Some(left) => Some(left),
            None => self.nodes.right(id)?,
        };
        let parent = self.nodes.parent(id)?;

        if let Some(child) = child {
            self.nodes.set_parent(child, parent)?;
        }
        self.replace_child(parent, id, child)?;
        self.allocator.free(id)?;
        trace!(ns = %self.ns, node = %id, "spliced node");

        self.rebalance_from(parent)
    }

    /// Point `parent`'s link to `old` at `new`, or the root if there is no parent.
    fn replace_child(
        &mut self,
        parent: Option<NodeId>,
        old: NodeId,
        new: Option<NodeId>,
    ) -> Result<()> {
        match parent {
            None => self.nodes.set_root(new),
            Some(parent) => {
                if self.nodes.left(parent)? == Some(old) {
                    self.nodes.set_left(parent, new)
                } else {
                    self.nodes.set_right(parent, new)
                }
            }
        }
    }

    /// Recompute height and balance factor of `id`, writing only what changed.
    fn update(&mut self, id: NodeId) -> Result<i32> {
        let left = self.nodes.height(self.nodes.left(id)?)?;
        let right = self.nodes.height(self.nodes.right(id)?)?;
        let height = 1 + left.max(right);
        let balance = right - left;

        if self.nodes.height(Some(id))? != height {
            self.nodes.set_height(id, height)?;
        }
        if self.nodes.balance_factor(id)? != balance {
            self.nodes.set_balance_factor(id, balance)?;
        }
        Ok(balance)
    }

    fn rebalance_from(&mut self, start: Option<NodeId>) -> Result<()> {
        let mut current = start;
        while let Some(id) = current {
            let subtree_root = self.rebalance_node(id)?;
            current = self.nodes.parent(subtree_root)?;
        }
        Ok(())
    }

    /// Restore balance at `id`; returns the root of the resulting subtree.
    fn rebalance_node(&mut self, id: NodeId) -> Result<NodeId> {
        match self.update(id)? {
            -2 => {
                let left = self.required_child(id, self.nodes.left(id)?, "left")?;
                let outer = self.nodes.height(self.nodes.left(left)?)?;
                let inner = self.nodes.height(self.nodes.right(left)?)?;
                if outer < inner {
                    self.rotate_left(left)?;
                }
                self.rotate_right(id)
            }
            2 => {
                let right = self.required_child(id, self.nodes.right(id)?, "right")?;
                let outer = self.nodes.height(self.nodes.right(right)?)?;
                let inner = self.nodes.height(self.nodes.left(right)?)?;
                if outer < inner {
                    self.rotate_right(right)?;
                }
                self.rotate_left(id)
            }
            _ => Ok(id),
        }
    }

    fn required_child(&self, id: NodeId, child: Option<NodeId>, side: &str) -> Result<NodeId> {
        child.ok_or_else(|| {
            Error::Corruption(format!(
                "tree {}: node {} is heavy on the {} but has no {} child",
                self.ns, id, side, side
            ))
        })
    }

    /// Rotate the edge between `id` and its left child; returns the new subtree root.
    fn rotate_right(&mut self, id: NodeId) -> Result<NodeId> {
        let pivot = self.required_child(id, self.nodes.left(id)?, "left")?;
        let inner = self.nodes.right(pivot)?;
        let parent = self.nodes.parent(id)?;

        self.nodes.set_left(id, inner)?;
        if let Some(inner) = inner {
            self.nodes.set_parent(inner, Some(id))?;
        }
        self.nodes.set_right(pivot, Some(id))?;
        self.nodes.set_parent(id, Some(pivot))?;
        self.nodes.set_parent(pivot, parent)?;
        self.replace_child(parent, id, Some(pivot))?;

        self.update(id)?;
        self.update(pivot)?;
        trace!(ns = %self.ns, node = %id, pivot = %pivot, "rotated right");
        Ok(pivot)
    }

    /// Rotate the edge between `id` and its right child; returns the new subtree root.
    fn rotate_left(&mut self, id: NodeId) -> Result<NodeId> {
        let pivot = self.required_child(id, self.nodes.right(id)?, "right")?;
        let inner = self.nodes.left(pivot)?;
        let parent = self.nodes.parent(id)?;

        self.nodes.set_right(id, inner)?;
        if let Some(inner) = inner {
            self.nodes.set_parent(inner, Some(id))?;
        }
        self.nodes.set_left(pivot, Some(id))?;
        self.nodes.set_parent(id, Some(pivot))?;
        self.nodes.set_parent(pivot, parent)?;
        self.replace_child(parent, id, Some(pivot))?;

        self.update(id)?;
        self.update(pivot)?;
        trace!(ns = %self.ns, node = %id, pivot = %pivot, "rotated left");
        Ok(pivot)
    }
}

impl std::fmt::Debug for AvlTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvlTree")
            .field("ns", &self.ns)
            .field("arity", &self.arity())
            .finish()
    }
}
