// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recycling allocator for a single message type.
//!
//! Released messages are destroyed in place and their storage is parked on a
//! bounded free list, so steady-state publishing does not touch the global
//! heap. An optional cap on live messages turns exhaustion into
//! [`Error::AllocationFailed`] instead of unbounded growth.

use super::{AllocatorStats, MessageAllocator};
use crate::error::{Error, Result};
use crate::message::Message;
use parking_lot::Mutex;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Free-list capacity used by [`PoolAllocator::default`].
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Storage-recycling allocator for messages of type `T`.
pub struct PoolAllocator<T: Message> {
    free: Mutex<Vec<Box<MaybeUninit<T>>>>,
    capacity: usize,
    max_live: Option<usize>,
    live: AtomicUsize,
    allocations: AtomicU64,
    deallocations: AtomicU64,
    reused: AtomicU64,
    failures: AtomicU64,
}

impl<T: Message> PoolAllocator<T> {
    /// Pool retaining at most `capacity` released slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            max_live: None,
            live: AtomicUsize::new(0),
            allocations: AtomicU64::new(0),
            deallocations: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Pool with `capacity` pre-allocated slots.
    #[must_use]
    pub fn with_preallocated(capacity: usize) -> Self {
        let pool = Self::new(capacity);
        {
            let mut free = pool.free.lock();
            free.extend((0..capacity).map(|_| Box::new(MaybeUninit::uninit())));
        }
        pool
    }

    /// Refuse allocations once `max_live` messages are alive.
    #[must_use]
    pub fn max_live(mut self, max_live: usize) -> Self {
        self.max_live = Some(max_live);
        self
    }

    /// Number of parked slots ready for reuse.
    pub fn free_slots(&self) -> usize {
        self.free.lock().len()
    }

    fn reserve_live(&self) -> Result<()> {
        let previous = self.live.fetch_add(1, Ordering::AcqRel);
        if let Some(max) = self.max_live {
            if previous >= max {
                self.live.fetch_sub(1, Ordering::AcqRel);
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "[pool] refusing allocation: {} live messages (max {})",
                    previous,
                    max
                );
                return Err(Error::AllocationFailed(format!(
                    "pool exhausted: {} live messages",
                    max
                )));
            }
        }
        Ok(())
    }
}

impl<T: Message> Default for PoolAllocator<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl<T: Message> MessageAllocator<T> for PoolAllocator<T> {
    fn allocate(&self, value: T) -> Result<Box<T>> {
        self.reserve_live()?;

        let recycled = self.free.lock().pop();
        let mut slot = match recycled {
            Some(slot) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                slot
            }
            None => Box::new(MaybeUninit::uninit()),
        };
        slot.write(value);
        self.allocations.fetch_add(1, Ordering::Relaxed);

        // SAFETY: the slot was initialised by `write` above and
        // `MaybeUninit<T>` has the same layout as `T`.
        Ok(unsafe { Box::from_raw(Box::into_raw(slot).cast::<T>()) })
    }

    fn deallocate(&self, message: Box<T>) {
        let raw = Box::into_raw(message);
        // SAFETY: `raw` comes from a live `Box<T>`; the value is dropped
        // exactly once here and the storage is reinterpreted as uninitialised.
        let slot = unsafe {
            std::ptr::drop_in_place(raw);
            Box::from_raw(raw.cast::<MaybeUninit<T>>())
        };

        {
            let mut free = self.free.lock();
            if free.len() < self.capacity {
                free.push(slot);
            }
        }

        self.live.fetch_sub(1, Ordering::AcqRel);
        self.deallocations.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl<T: Message> std::fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("capacity", &self.capacity)
            .field("max_live", &self.max_live)
            .field("free_slots", &self.free_slots())
            .field("stats", &MessageAllocator::stats(self))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Clone)]
    struct DropProbe {
        drops: Arc<AtomicUsize>,
        payload: Vec<u8>,
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_pool_reuses_released_storage() {
        let pool = PoolAllocator::<Vec<u8>>::new(4);
        let first = pool.allocate(vec![1, 2, 3]).expect("alloc");
        let first_addr = std::ptr::addr_of!(*first) as usize;
        pool.deallocate(first);
        assert_eq!(pool.free_slots(), 1);

        let second = pool.allocate(vec![4]).expect("alloc");
        assert_eq!(std::ptr::addr_of!(*second) as usize, first_addr);
        assert_eq!(*second, vec![4]);

        let stats = pool.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.reused, 1);
        pool.deallocate(second);
        assert_eq!(pool.stats().live(), 0);
    }

    #[test]
    fn test_pool_drops_value_on_release() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pool = PoolAllocator::<DropProbe>::new(2);
        let msg = pool
            .allocate(DropProbe {
                drops: Arc::clone(&drops),
                payload: vec![0; 16],
            })
            .expect("alloc");
        assert_eq!(msg.payload.len(), 16);

        pool.deallocate(msg);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(pool.free_slots(), 1);
    }

    #[test]
    fn test_pool_capacity_bounds_free_list() {
        let pool = PoolAllocator::<u32>::new(1);
        let a = pool.allocate(1).expect("alloc");
        let b = pool.allocate(2).expect("alloc");
        pool.deallocate(a);
        pool.deallocate(b);
        assert_eq!(pool.free_slots(), 1);
    }

    #[test]
    fn test_pool_max_live_refuses() {
        let pool = PoolAllocator::<u32>::new(2).max_live(1);
        let held = pool.allocate(1).expect("first allocation fits");

        let err = pool.allocate(2).expect_err("second allocation exceeds max_live");
        assert!(matches!(err, Error::AllocationFailed(_)));
        assert_eq!(pool.stats().failures, 1);

        pool.deallocate(held);
        assert!(pool.allocate(3).is_ok());
    }

    #[test]
    fn test_pool_random_churn() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let pool = PoolAllocator::<Vec<u8>>::new(8).max_live(16);
        let mut held = Vec::new();

        for _ in 0..1000 {
            if held.is_empty() || (held.len() < 16 && rng.bool()) {
                let len = rng.usize(0..64);
                held.push(pool.allocate(vec![0u8; len]).expect("below max_live"));
            } else {
                let victim = held.swap_remove(rng.usize(0..held.len()));
                pool.deallocate(victim);
            }
            assert!(pool.free_slots() <= 8);
        }
        for msg in held.drain(..) {
            pool.deallocate(msg);
        }

        let stats = pool.stats();
        assert_eq!(stats.live(), 0);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn test_pool_preallocated_slots() {
        let pool = PoolAllocator::<u64>::with_preallocated(3);
        assert_eq!(pool.free_slots(), 3);
        let msg = pool.allocate(9).expect("alloc");
        assert_eq!(pool.stats().reused, 1);
        pool.deallocate(msg);
    }
}
