//! Identifier types
//!
//! - [`FileId`]: numeric namespace prefix that keeps structures apart in the
//!   shared byte store
//! - [`NodeId`]: identifier of a dictionary node, issued by the index allocator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace prefix for a logical structure
///
/// Every dictionary, counter family and list lives under its own `FileId`,
/// so many structures share one physical byte-store namespace without
/// colliding.
///
/// # Examples
///
/// ```
/// use chatkv_core::FileId;
///
/// let users = FileId(12);
/// assert_eq!(users.to_string(), "12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl FileId {
    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for FileId {
    fn from(id: u64) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a node inside a persistent dictionary
///
/// Nodes never reference each other directly; `left`, `right` and `parent`
/// links are `Option<NodeId>` values resolved through the store. Ids are
/// unique among live nodes and recycled after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Encode an optional link for storage, using the sentinel for `None`.
    ///
    /// ```
    /// use chatkv_core::NodeId;
    ///
    /// assert_eq!(NodeId::encode_link(Some(NodeId(4))), "4");
    /// assert_eq!(NodeId::encode_link(None), "N");
    /// ```
    pub fn encode_link(link: Option<NodeId>) -> String {
        match link {
            Some(id) => id.to_string(),
            None => crate::keys::NO_LINK.to_string(),
        }
    }

    /// Decode a stored link. Returns `None` if `raw` is neither the sentinel
    /// nor a valid id.
    ///
    /// ```
    /// use chatkv_core::NodeId;
    ///
    /// assert_eq!(NodeId::decode_link("4"), Some(Some(NodeId(4))));
    /// assert_eq!(NodeId::decode_link("N"), Some(None));
    /// assert_eq!(NodeId::decode_link("four"), None);
    /// ```
    pub fn decode_link(raw: &str) -> Option<Option<NodeId>> {
        if raw == crate::keys::NO_LINK {
            return Some(None);
        }
        raw.parse::<NodeId>().ok().map(Some)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
