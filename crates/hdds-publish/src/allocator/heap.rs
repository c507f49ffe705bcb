// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global-heap allocator with counters.

use super::{AllocatorStats, MessageAllocator};
use crate::error::Result;
use crate::message::Message;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default allocator: one global-heap box per message.
///
/// Works for every message type, so a single instance can back several
/// publishers. Counters are relaxed atomics and only meant for introspection.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    allocations: AtomicU64,
    deallocations: AtomicU64,
}

impl HeapAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counters, independent of the message type.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            reused: 0,
            failures: 0,
        }
    }
}

impl<T: Message> MessageAllocator<T> for HeapAllocator {
    fn allocate(&self, value: T) -> Result<Box<T>> {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(value))
    }

    fn deallocate(&self, message: Box<T>) {
        drop(message);
        self.deallocations.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> AllocatorStats {
        HeapAllocator::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_allocator_counts() {
        let heap = HeapAllocator::new();
        let a = MessageAllocator::<u64>::allocate(&heap, 7).expect("alloc");
        let b = MessageAllocator::<u64>::allocate(&heap, 8).expect("alloc");
        assert_eq!(*a + *b, 15);
        assert_eq!(heap.stats().allocations, 2);

        MessageAllocator::<u64>::deallocate(&heap, a);
        assert_eq!(heap.stats().live(), 1);
        MessageAllocator::<u64>::deallocate(&heap, b);
        assert_eq!(heap.stats().live(), 0);
    }
}
