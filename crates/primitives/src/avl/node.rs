//! Store-backed node accessor
//!
//! Nodes are never materialized as a pointer graph. Each field of each node
//! is its own store entry (`{ns},{node},{field}`), and every read or write of
//! a link, height or key component goes through [`NodeStore`]. Tree metadata
//! (root pointer and size) lives alongside under `{ns},root_index` and
//! `{ns},size`.

use crate::field_store::FieldStore;
use chatkv_core::keys::{self, NodeField};
use chatkv_core::{Error, FileId, NodeId, Result};
use std::str::FromStr;
use std::sync::Arc;

/// Height recorded for an absent child.
pub(crate) const EMPTY_HEIGHT: i32 = -1;

#[derive(Debug, Clone)]
pub(crate) struct NodeStore {
    fields: Arc<FieldStore>,
    ns: FileId,
}

impl NodeStore {
    pub(crate) fn new(fields: Arc<FieldStore>, ns: FileId) -> Self {
        Self { fields, ns }
    }

    fn read(&self, id: NodeId, field: NodeField) -> Result<String> {
        let key = keys::node_field_key(self.ns, id, field);
        self.fields
            .get(&key)?
            .ok_or_else(|| Error::corrupt_value(&key, "node field missing"))
    }

    fn read_parsed<T>(&self, id: NodeId, field: NodeField) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let key = keys::node_field_key(self.ns, id, field);
        self.fields
            .get_parsed::<T>(&key)?
            .ok_or_else(|| Error::corrupt_value(&key, "node field missing"))
    }

    fn write(&self, id: NodeId, field: NodeField, value: &str) -> Result<()> {
        self.fields
            .put(&keys::node_field_key(self.ns, id, field), value)
    }

    fn read_link(&self, id: NodeId, field: NodeField) -> Result<Option<NodeId>> {
        let raw = self.read(id, field)?;
        NodeId::decode_link(&raw).ok_or_else(|| {
            Error::corrupt_value(
                &keys::node_field_key(self.ns, id, field),
                format!("invalid link {:?}", raw),
            )
        })
    }

    fn write_link(&self, id: NodeId, field: NodeField, link: Option<NodeId>) -> Result<()> {
        self.write(id, field, &NodeId::encode_link(link))
    }

    // =========================================================================
    // Node lifecycle
    // =========================================================================

    /// Write every field of a fresh leaf.
    pub(crate) fn create<K: AsRef<str>>(
        &self,
        id: NodeId,
        key: &[K],
        data: &str,
        parent: Option<NodeId>,
    ) -> Result<()> {
        self.set_height(id, 0)?;
        self.set_balance_factor(id, 0)?;
        self.set_data(id, data)?;
        self.set_left(id, None)?;
        self.set_right(id, None)?;
        self.set_parent(id, parent)?;
        for (i, component) in key.iter().enumerate() {
            self.write(id, NodeField::Key(i), component.as_ref())?;
        }
        Ok(())
    }

    // =========================================================================
    // Field accessors
    // =========================================================================

    /// Height of an optional subtree, [`EMPTY_HEIGHT`] when absent.
    pub(crate) fn height(&self, id: Option<NodeId>) -> Result<i32> {
        match id {
            Some(id) => self.read_parsed(id, NodeField::Height),
            None => Ok(EMPTY_HEIGHT),
        }
    }

    pub(crate) fn set_height(&self, id: NodeId, height: i32) -> Result<()> {
        self.write(id, NodeField::Height, &height.to_string())
    }

    pub(crate) fn balance_factor(&self, id: NodeId) -> Result<i32> {
        self.read_parsed(id, NodeField::BalanceFactor)
    }

    pub(crate) fn set_balance_factor(&self, id: NodeId, balance: i32) -> Result<()> {
        self.write(id, NodeField::BalanceFactor, &balance.to_string())
    }

    pub(crate) fn data(&self, id: NodeId) -> Result<String> {
        self.read(id, NodeField::Data)
    }

    pub(crate) fn set_data(&self, id: NodeId, data: &str) -> Result<()> {
        self.write(id, NodeField::Data, data)
    }

    pub(crate) fn left(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.read_link(id, NodeField::Left)
    }

    pub(crate) fn set_left(&self, id: NodeId, link: Option<NodeId>) -> Result<()> {
        self.write_link(id, NodeField::Left, link)
    }

    pub(crate) fn right(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.read_link(id, NodeField::Right)
    }

    pub(crate) fn set_right(&self, id: NodeId, link: Option<NodeId>) -> Result<()> {
        self.write_link(id, NodeField::Right, link)
    }

    pub(crate) fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.read_link(id, NodeField::Parent)
    }

    pub(crate) fn set_parent(&self, id: NodeId, link: Option<NodeId>) -> Result<()> {
        self.write_link(id, NodeField::Parent, link)
    }

    pub(crate) fn key_component(&self, id: NodeId, index: usize) -> Result<String> {
        self.read(id, NodeField::Key(index))
    }

    pub(crate) fn key(&self, id: NodeId, arity: usize) -> Result<Vec<String>> {
        (0..arity).map(|i| self.key_component(id, i)).collect()
    }

    /// Copy key components and payload from `src` onto `dst`.
    pub(crate) fn copy_entry(&self, src: NodeId, dst: NodeId, arity: usize) -> Result<()> {
        for i in 0..arity {
            let component = self.key_component(src, i)?;
            self.write(dst, NodeField::Key(i), &component)?;
        }
        let data = self.data(src)?;
        self.set_data(dst, &data)
    }

    // =========================================================================
    // Tree metadata
    // =========================================================================

    pub(crate) fn root(&self) -> Result<Option<NodeId>> {
        let key = keys::root_key(self.ns);
        match self.fields.get(&key)? {
            Some(raw) => NodeId::decode_link(&raw)
                .ok_or_else(|| Error::corrupt_value(&key, format!("invalid link {:?}", raw))),
            None => Ok(None),
        }
    }

    pub(crate) fn set_root(&self, link: Option<NodeId>) -> Result<()> {
        self.fields
            .put(&keys::root_key(self.ns), &NodeId::encode_link(link))
    }

    pub(crate) fn size(&self) -> Result<u64> {
        Ok(self
            .fields
            .get_parsed::<u64>(&keys::size_key(self.ns))?
            .unwrap_or(0))
    }

    pub(crate) fn set_size(&self, size: u64) -> Result<()> {
        self.fields.put(&keys::size_key(self.ns), &size.to_string())
    }
}
