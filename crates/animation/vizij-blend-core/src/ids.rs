//! Identifiers and simple allocators for blend nodes and machine states.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Identity of a leaf or tree. Assigned once at construction and used to tag events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A tree registered with a [`StateMachine`](crate::machine::StateMachine).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

static NEXT_NODE: AtomicU32 = AtomicU32::new(0);

impl NodeId {
    /// Allocate a fresh process-wide node id.
    #[inline]
    pub(crate) fn next() -> Self {
        NodeId(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Monotonic allocator for StateId.
/// Dense indices double as positions in the machine's state table.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_state: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_state(&mut self) -> StateId {
        let id = StateId(self.next_state);
        self.next_state = self.next_state.wrapping_add(1);
        id
    }
}
