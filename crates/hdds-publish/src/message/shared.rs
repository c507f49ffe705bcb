// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Message, Ownership};
use crate::allocator::MessageDeleter;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::Arc;

struct SharedSlot<T: Message> {
    value: ManuallyDrop<Box<T>>,
    deleter: MessageDeleter<T>,
}

impl<T: Message> Drop for SharedSlot<T> {
    fn drop(&mut self) {
        // SAFETY: `value` is taken exactly once, here, and never read again.
        let storage = unsafe { ManuallyDrop::take(&mut self.value) };
        self.deleter.release(storage);
    }
}

/// Reference-counted, read-only handle to a promoted message.
///
/// Only obtainable through [`ExclusiveMessage::into_shared`](super::ExclusiveMessage::into_shared),
/// so it is never null. The last clone to go away releases the storage through
/// the allocator binding carried over from the exclusive handle.
pub struct SharedMessage<T: Message> {
    slot: Arc<SharedSlot<T>>,
}

impl<T: Message> SharedMessage<T> {
    pub(crate) fn from_parts(storage: Box<T>, deleter: MessageDeleter<T>) -> Self {
        Self {
            slot: Arc::new(SharedSlot {
                value: ManuallyDrop::new(storage),
                deleter,
            }),
        }
    }

    /// Number of live handles to this message.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.slot)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    pub fn ownership(&self) -> Ownership {
        Ownership::Shared
    }

    pub fn deleter(&self) -> &MessageDeleter<T> {
        &self.slot.deleter
    }
}

impl<T: Message> Clone for SharedMessage<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Message> Deref for SharedMessage<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.slot.value
    }
}

impl<T: Message + std::fmt::Debug> std::fmt::Debug for SharedMessage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMessage")
            .field("value", &**self)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::allocator::{HeapAllocator, PoolAllocator};
    use crate::message::{ExclusiveMessage, Ownership};
    use std::sync::Arc;

    #[test]
    fn test_last_clone_releases() {
        let heap = Arc::new(HeapAllocator::new());
        let shared = ExclusiveMessage::new_in(vec![1u8, 2, 3], &heap)
            .and_then(ExclusiveMessage::into_shared)
            .expect("alloc + promote");
        let other = shared.clone();
        assert_eq!(shared.ref_count(), 2);
        assert!(shared.ptr_eq(&other));
        assert_eq!(other.ownership(), Ownership::Shared);

        drop(shared);
        assert_eq!(heap.stats().live(), 1);
        assert_eq!(*other, vec![1, 2, 3]);

        drop(other);
        assert_eq!(heap.stats().live(), 0);
    }

    #[test]
    fn test_shared_returns_storage_to_pool() {
        let pool = Arc::new(PoolAllocator::<String>::new(4));
        let shared = ExclusiveMessage::new_in("pooled".to_string(), &pool)
            .and_then(ExclusiveMessage::into_shared)
            .expect("alloc + promote");
        assert_eq!(shared.len(), 6);
        drop(shared);
        assert_eq!(pool.free_slots(), 1);
    }
}
