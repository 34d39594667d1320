//! Key-naming scheme
//!
//! Every higher-level structure is flattened into UTF-8 keys built here.
//! The layout must stay byte-for-byte stable: any process sharing a store
//! relies on it to find the same data.
//!
//! | Structure | Key |
//! |-----------|-----|
//! | map entry | `map-{key}` |
//! | counter | `counter-{id}` / `counter-{id},{extra}` |
//! | validity flag | `validator-{id},{key}` / `validator-{id},{key},{extra}` |
//! | integer list | `list-{id}` / `list-{id},{key}` |
//! | node field | `{ns},{node},{field}` |
//! | tree root / size | `{ns},root_index` / `{ns},size` |
//! | tree key orders | `{ns},orders` |
//! | allocator | `{ns},allocator,next` / `{ns},allocator,free_count` / `{ns},allocator,free,{i}` |

use crate::types::{FileId, NodeId};

/// Sentinel stored in place of a node id for "no child / no parent / no root".
pub const NO_LINK: &str = "N";

/// Separator between key components.
pub const DELIMITER: char = ',';

const MAP_TAG: &str = "map-";
const COUNTER_TAG: &str = "counter-";
const VALIDATOR_TAG: &str = "validator-";
const LIST_TAG: &str = "list-";

/// Key of a free-form map entry.
pub fn map_key(key: &str) -> String {
    format!("{}{}", MAP_TAG, key)
}

/// Key of a named counter, optionally scoped by a secondary component.
pub fn counter_key(id: FileId, extra: Option<&str>) -> String {
    match extra {
        Some(extra) => format!("{}{}{}{}", COUNTER_TAG, id, DELIMITER, extra),
        None => format!("{}{}", COUNTER_TAG, id),
    }
}

/// Key of a validity flag.
pub fn validator_key(id: FileId, key: &str, extra: Option<&str>) -> String {
    match extra {
        Some(extra) => format!(
            "{}{}{}{}{}{}",
            VALIDATOR_TAG, id, DELIMITER, key, DELIMITER, extra
        ),
        None => format!("{}{}{}{}", VALIDATOR_TAG, id, DELIMITER, key),
    }
}

/// Key of an integer list.
pub fn list_key(id: FileId, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{}{}{}{}", LIST_TAG, id, DELIMITER, key),
        None => format!("{}{}", LIST_TAG, id),
    }
}

/// A single persisted field of a dictionary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    /// Cached subtree height
    Height,
    /// Cached `height(right) - height(left)`
    BalanceFactor,
    /// Opaque payload
    Data,
    /// Left child link
    Left,
    /// Right child link
    Right,
    /// Parent link
    Parent,
    /// Component `i` of the composite key
    Key(usize),
}

impl NodeField {
    /// Position of this field in the node layout.
    pub fn index(&self) -> usize {
        match self {
            NodeField::Height => 0,
            NodeField::BalanceFactor => 1,
            NodeField::Data => 2,
            NodeField::Left => 3,
            NodeField::Right => 4,
            NodeField::Parent => 5,
            NodeField::Key(i) => 6 + i,
        }
    }
}

/// Key of one field of one node.
pub fn node_field_key(ns: FileId, node: NodeId, field: NodeField) -> String {
    format!("{}{}{}{}{}", ns, DELIMITER, node, DELIMITER, field.index())
}

/// Key of a tree's root pointer.
pub fn root_key(ns: FileId) -> String {
    format!("{}{}root_index", ns, DELIMITER)
}

/// Key of a tree's persisted size.
pub fn size_key(ns: FileId) -> String {
    format!("{}{}size", ns, DELIMITER)
}

/// Key of the comma-separated key orders a tree was created with.
pub fn tree_orders_key(ns: FileId) -> String {
    format!("{}{}orders", ns, DELIMITER)
}

/// Key of an allocator's high-water mark.
pub fn allocator_next_key(ns: FileId) -> String {
    format!("{}{}allocator{}next", ns, DELIMITER, DELIMITER)
}

/// Key of an allocator's free-stack length.
pub fn allocator_free_count_key(ns: FileId) -> String {
    format!("{}{}allocator{}free_count", ns, DELIMITER, DELIMITER)
}

/// Key of slot `slot` of an allocator's free stack.
pub fn allocator_free_slot_key(ns: FileId, slot: u64) -> String {
    format!(
        "{}{}allocator{}free{}{}",
        ns, DELIMITER, DELIMITER, DELIMITER, slot
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_keys() {
        assert_eq!(map_key("motd"), "map-motd");
        assert_eq!(counter_key(FileId(7), None), "counter-7");
        assert_eq!(counter_key(FileId(7), Some("#rust")), "counter-7,#rust");
        assert_eq!(validator_key(FileId(3), "alice", None), "validator-3,alice");
        assert_eq!(
            validator_key(FileId(3), "alice", Some("#rust")),
            "validator-3,alice,#rust"
        );
        assert_eq!(list_key(FileId(9), None), "list-9");
        assert_eq!(list_key(FileId(9), Some("bob")), "list-9,bob");
    }

    #[test]
    fn test_node_keys() {
        let ns = FileId(2);
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Height), "2,5,0");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::BalanceFactor), "2,5,1");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Data), "2,5,2");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Left), "2,5,3");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Right), "2,5,4");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Parent), "2,5,5");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Key(0)), "2,5,6");
        assert_eq!(node_field_key(ns, NodeId(5), NodeField::Key(2)), "2,5,8");
    }

    #[test]
    fn test_tree_and_allocator_keys() {
        let ns = FileId(11);
        assert_eq!(root_key(ns), "11,root_index");
        assert_eq!(size_key(ns), "11,size");
        assert_eq!(tree_orders_key(ns), "11,orders");
        assert_eq!(allocator_next_key(ns), "11,allocator,next");
        assert_eq!(allocator_free_count_key(ns), "11,allocator,free_count");
        assert_eq!(allocator_free_slot_key(ns, 0), "11,allocator,free,0");
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        assert_ne!(root_key(FileId(1)), root_key(FileId(10)));
        assert_ne!(
            node_field_key(FileId(1), NodeId(12), NodeField::Height),
            node_field_key(FileId(11), NodeId(2), NodeField::Height)
        );
    }
}
