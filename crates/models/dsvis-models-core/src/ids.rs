//! Per-structure id allocation.
//!
//! One monotonic counter per structure instance feeds every node prefix, so
//! `lst_node_0`, `lst_sentinel_1`, `lst_node_2` never collide. The allocator
//! outlives the model: the scene hands it to the next instance created under
//! the same structure id, keeping ids disjoint across delete/recreate.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next raw counter value.
    #[inline]
    pub fn alloc_raw(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    /// `"{structure_id}_{prefix}_{n}"`
    pub fn alloc_node(&mut self, structure_id: &str, prefix: &str) -> String {
        let n = self.alloc_raw();
        format!("{structure_id}_{prefix}_{n}")
    }

    /// Value the next allocation will return.
    #[inline]
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Ensure future allocations start at `n` or later.
    pub fn bump_to(&mut self, n: u64) {
        if n > self.next {
            self.next = n;
        }
    }

    /// `"{structure_id}|{edge_kind}|{src}->{dst}"`, a pure function of its inputs.
    pub fn edge_id(structure_id: &str, edge_kind: &str, src: &str, dst: &str) -> String {
        format!("{structure_id}|{edge_kind}|{src}->{dst}")
    }
}
