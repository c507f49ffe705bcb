// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pluggable message allocation.
//!
//! A [`Publisher`](crate::Publisher) is bound to one allocator for its whole
//! lifetime. Messages it constructs carry a [`MessageDeleter`] derived from
//! that allocator, so storage always goes back to the allocator that produced
//! it, whether the last owner is an exclusive or a shared handle.
//!
//! ```text
//! Arc<A: MessageAllocator<T>>
//!   +-- MessageDeleter<T>  (Arc<dyn MessageAllocator<T>>, same allocation)
//!         +-- ExclusiveMessage<T> --into_shared()--> SharedMessage<T>
//!                                 \__ drop --> A::deallocate
//! ```

mod heap;
mod pool;

pub use heap::HeapAllocator;
pub use pool::{PoolAllocator, DEFAULT_POOL_CAPACITY};

use crate::error::Result;
use crate::message::{ExclusiveMessage, Message};
use std::sync::Arc;

/// Allocation strategy for messages of type `T`.
///
/// Implementations must be usable from several threads at once; the publish
/// path adds no locking of its own.
pub trait MessageAllocator<T: Message>: Send + Sync + 'static {
    /// Obtain storage for one message and move `value` into it.
    fn allocate(&self, value: T) -> Result<Box<T>>;

    /// Destroy the message and release its storage.
    ///
    /// Only called with boxes previously returned by [`allocate`](Self::allocate)
    /// on the same allocator.
    fn deallocate(&self, message: Box<T>);

    /// Snapshot of allocation counters.
    fn stats(&self) -> AllocatorStats;
}

/// Allocation counters exposed for introspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Messages destroyed and released.
    pub deallocations: u64,
    /// Allocations served from recycled storage.
    pub reused: u64,
    /// Allocation requests that were refused.
    pub failures: u64,
}

impl AllocatorStats {
    /// Messages currently alive.
    #[must_use]
    pub fn live(&self) -> u64 {
        self.allocations.saturating_sub(self.deallocations)
    }
}

/// Release half of an allocator binding.
///
/// Cloning is cheap and every clone refers to the same allocator instance.
pub struct MessageDeleter<T: Message> {
    allocator: Arc<dyn MessageAllocator<T>>,
}

impl<T: Message> MessageDeleter<T> {
    /// Derive the deleter for `allocator`.
    pub fn for_allocator<A: MessageAllocator<T>>(allocator: &Arc<A>) -> Self {
        let allocator: Arc<dyn MessageAllocator<T>> = allocator.clone();
        Self { allocator }
    }

    /// Construct a message through the bound allocator.
    pub fn allocate(&self, value: T) -> Result<ExclusiveMessage<T>> {
        let storage = self.allocator.allocate(value)?;
        Ok(ExclusiveMessage::from_parts(storage, self.clone()))
    }

    /// True when this deleter was derived from `allocator`.
    pub fn is_bound_to<A: MessageAllocator<T>>(&self, allocator: &Arc<A>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.allocator), Arc::as_ptr(allocator))
    }

    /// True when both deleters release into the same allocator.
    pub fn same_allocator(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.allocator, &other.allocator)
    }

    pub(crate) fn release(&self, message: Box<T>) {
        self.allocator.deallocate(message);
    }

    pub(crate) fn stats(&self) -> AllocatorStats {
        self.allocator.stats()
    }
}

impl<T: Message> Clone for MessageDeleter<T> {
    fn clone(&self) -> Self {
        Self {
            allocator: Arc::clone(&self.allocator),
        }
    }
}

impl<T: Message> std::fmt::Debug for MessageDeleter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDeleter")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleter_bound_to_its_allocator() {
        let heap = Arc::new(HeapAllocator::new());
        let other = Arc::new(HeapAllocator::new());
        let deleter = MessageDeleter::<u32>::for_allocator(&heap);

        assert!(deleter.is_bound_to(&heap));
        assert!(!deleter.is_bound_to(&other));
        assert!(deleter.same_allocator(&deleter.clone()));
    }

    #[test]
    fn test_deleter_allocates_and_releases() {
        let heap = Arc::new(HeapAllocator::new());
        let deleter = MessageDeleter::<String>::for_allocator(&heap);

        let msg = deleter
            .allocate("hello".to_string())
            .expect("heap allocation should succeed");
        assert_eq!(msg.get().map(String::as_str), Some("hello"));
        assert_eq!(heap.stats().live(), 1);

        drop(msg);
        let stats = heap.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.deallocations, 1);
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn test_stats_live_saturates() {
        let stats = AllocatorStats {
            allocations: 1,
            deallocations: 3,
            ..AllocatorStats::default()
        };
        assert_eq!(stats.live(), 0);
    }
}
