//! One tick group's ordered membership.

use crate::capabilities::CapabilityHandle;

use super::tick_group::TickGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketEntry {
    tick_order: u32,
    handle: CapabilityHandle,
}

/// Capabilities sharing one tick group, ascending by tick order; equal
/// orders keep registration order.
#[derive(Debug, Clone)]
pub struct TickBucket {
    group: TickGroup,
    entries: Vec<BucketEntry>,
}

impl TickBucket {
    pub fn new(group: TickGroup) -> Self {
        Self {
            group,
            entries: Vec::new(),
        }
    }

    pub fn group(&self) -> TickGroup {
        self.group
    }

    pub(crate) fn insert(&mut self, handle: CapabilityHandle, tick_order: u32) {
        self.entries.push(BucketEntry { tick_order, handle });
        // Stable: ties stay in registration order.
        self.entries.sort_by_key(|e| e.tick_order);
    }

    /// Members in visiting order.
    pub fn handles(&self) -> impl Iterator<Item = CapabilityHandle> + '_ {
        self.entries.iter().map(|e| e.handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
