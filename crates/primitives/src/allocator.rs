//! Persistent index allocator
//!
//! Issues [`NodeId`]s for dictionary nodes and recycles freed ones. State is
//! two pieces, both stored through the [`FieldStore`] like everything else:
//!
//! - a high-water mark: the largest id ever issued (0 before the first)
//! - a free stack: a counted sequence `free,0 .. free,{count-1}` of ids
//!   returned by [`IndexAllocator::free`]
//!
//! `allocate` pops the free stack when it is non-empty and otherwise bumps
//! the high-water mark. Because both live in the store, a reopened allocator
//! continues exactly where the previous one stopped.

use crate::field_store::FieldStore;
use chatkv_core::keys;
use chatkv_core::{Error, FileId, NodeId, Result};
use std::sync::Arc;
use tracing::trace;

/// Recycling id allocator scoped to one namespace
#[derive(Debug, Clone)]
pub struct IndexAllocator {
    fields: Arc<FieldStore>,
    ns: FileId,
}

impl IndexAllocator {
    /// Bind an allocator to `ns`.
    pub fn new(fields: Arc<FieldStore>, ns: FileId) -> Self {
        Self { fields, ns }
    }

    /// Namespace the allocator state is stored under
    pub fn namespace(&self) -> FileId {
        self.ns
    }

    /// Issue an id that is not currently in use.
    pub fn allocate(&self) -> Result<NodeId> {
        let free = self.free_count()?;
        if free > 0 {
            let slot = free - 1;
            let slot_key = keys::allocator_free_slot_key(self.ns, slot);
            let id = self
                .fields
                .get_parsed::<NodeId>(&slot_key)?
                .ok_or_else(|| Error::corrupt_value(&slot_key, "free stack slot missing"))?;
            self.fields
                .put(&keys::allocator_free_count_key(self.ns), &slot.to_string())?;
            trace!(ns = %self.ns, id = %id, "recycled node id");
            return Ok(id);
        }

        let next = self.high_water_mark()? + 1;
        self.fields
            .put(&keys::allocator_next_key(self.ns), &next.to_string())?;
        trace!(ns = %self.ns, id = next, "issued fresh node id");
        Ok(NodeId(next))
    }

    /// Return `id` to the pool.
    ///
    /// `id` must have come from [`allocate`](Self::allocate) and must not
    /// already be free. This is not checked: a double free lets the same id
    /// be issued twice.
    pub fn free(&self, id: NodeId) -> Result<()> {
        let free = self.free_count()?;
        // Slot before count: a crash in between leaves the stack unchanged.
        self.fields.put(
            &keys::allocator_free_slot_key(self.ns, free),
            &id.to_string(),
        )?;
        self.fields.put(
            &keys::allocator_free_count_key(self.ns),
            &(free + 1).to_string(),
        )?;
        trace!(ns = %self.ns, id = %id, "freed node id");
        Ok(())
    }

    /// Largest id ever issued; 0 if none
    pub fn high_water_mark(&self) -> Result<u64> {
        Ok(self
            .fields
            .get_parsed::<u64>(&keys::allocator_next_key(self.ns))?
            .unwrap_or(0))
    }

    /// Number of ids waiting to be recycled
    pub fn free_count(&self) -> Result<u64> {
        Ok(self
            .fields
            .get_parsed::<u64>(&keys::allocator_free_count_key(self.ns))?
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatkv_storage::MemoryStore;
    use std::collections::HashSet;

    fn fields() -> Arc<FieldStore> {
        Arc::new(FieldStore::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn test_fresh_ids_start_at_one() {
        let alloc = IndexAllocator::new(fields(), FileId(1));
        assert_eq!(alloc.allocate().unwrap(), NodeId(1));
        assert_eq!(alloc.allocate().unwrap(), NodeId(2));
        assert_eq!(alloc.allocate().unwrap(), NodeId(3));
        assert_eq!(alloc.high_water_mark().unwrap(), 3);
    }

    #[test]
    fn test_freed_id_is_reused_first() {
        let alloc = IndexAllocator::new(fields(), FileId(1));
        for _ in 0..3 {
            alloc.allocate().unwrap();
        }
        alloc.free(NodeId(2)).unwrap();
        assert_eq!(alloc.free_count().unwrap(), 1);

        assert_eq!(alloc.allocate().unwrap(), NodeId(2));
        assert_eq!(alloc.allocate().unwrap(), NodeId(4));
        assert_eq!(alloc.free_count().unwrap(), 0);
    }

    #[test]
    fn test_free_stack_is_lifo() {
        let alloc = IndexAllocator::new(fields(), FileId(1));
        for _ in 0..5 {
            alloc.allocate().unwrap();
        }
        alloc.free(NodeId(1)).unwrap();
        alloc.free(NodeId(4)).unwrap();
        alloc.free(NodeId(3)).unwrap();

        assert_eq!(alloc.allocate().unwrap(), NodeId(3));
        assert_eq!(alloc.allocate().unwrap(), NodeId(4));
        assert_eq!(alloc.allocate().unwrap(), NodeId(1));
        assert_eq!(alloc.allocate().unwrap(), NodeId(6));
    }

    #[test]
    fn test_state_survives_new_handle() {
        let fields = fields();
        {
            let alloc = IndexAllocator::new(fields.clone(), FileId(8));
            alloc.allocate().unwrap();
            alloc.allocate().unwrap();
            alloc.free(NodeId(1)).unwrap();
        }
        fields.clear_cache();

        let alloc = IndexAllocator::new(fields, FileId(8));
        assert_eq!(alloc.allocate().unwrap(), NodeId(1));
        assert_eq!(alloc.allocate().unwrap(), NodeId(3));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let fields = fields();
        let a = IndexAllocator::new(fields.clone(), FileId(1));
        let b = IndexAllocator::new(fields, FileId(2));

        a.allocate().unwrap();
        a.allocate().unwrap();
        assert_eq!(b.allocate().unwrap(), NodeId(1));
    }

    #[test]
    fn test_live_ids_never_collide() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let alloc = IndexAllocator::new(fields(), FileId(1));
        let mut rng = StdRng::seed_from_u64(0xA110C);
        let mut live: Vec<NodeId> = Vec::new();

        for _ in 0..2_000 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let id = alloc.allocate().unwrap();
                assert!(!live.contains(&id), "{} issued while live", id);
                live.push(id);
            } else {
                let victim = live.swap_remove(rng.gen_range(0..live.len()));
                alloc.free(victim).unwrap();
            }
        }

        let unique: HashSet<_> = live.iter().collect();
        assert_eq!(unique.len(), live.len());
        let issued = alloc.high_water_mark().unwrap();
        assert_eq!(issued, live.len() as u64 + alloc.free_count().unwrap());
    }
}
