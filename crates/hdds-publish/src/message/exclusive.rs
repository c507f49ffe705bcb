// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Message, Ownership, SharedMessage};
use crate::allocator::{MessageAllocator, MessageDeleter};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Single-owner handle to an allocator-backed message.
///
/// Dropping the handle destroys the message through the allocator that
/// created it. A handle can be null (see [`empty`](Self::empty) and
/// [`reset`](Self::reset)); publishing a null handle is rejected.
///
/// # Example
///
/// ```ignore
/// let allocator = Arc::new(HeapAllocator::new());
/// let msg = ExclusiveMessage::new_in(Point { x: 1 }, &allocator)?;
/// let shared = msg.into_shared()?; // same storage, now reference counted
/// ```
pub struct ExclusiveMessage<T: Message> {
    slot: Option<Box<T>>,
    deleter: MessageDeleter<T>,
}

impl<T: Message> ExclusiveMessage<T> {
    pub(crate) fn from_parts(storage: Box<T>, deleter: MessageDeleter<T>) -> Self {
        Self {
            slot: Some(storage),
            deleter,
        }
    }

    /// Construct `value` in storage obtained from `allocator`.
    pub fn new_in<A: MessageAllocator<T>>(value: T, allocator: &Arc<A>) -> Result<Self> {
        MessageDeleter::for_allocator(allocator).allocate(value)
    }

    /// Null handle bound to `deleter`.
    pub fn empty(deleter: MessageDeleter<T>) -> Self {
        Self {
            slot: None,
            deleter,
        }
    }

    pub fn is_null(&self) -> bool {
        self.slot.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        self.slot.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.slot.as_deref_mut()
    }

    pub fn ownership(&self) -> Ownership {
        Ownership::Exclusive
    }

    pub fn deleter(&self) -> &MessageDeleter<T> {
        &self.deleter
    }

    /// Destroy the message now, leaving a null handle.
    pub fn reset(&mut self) {
        if let Some(storage) = self.slot.take() {
            self.deleter.release(storage);
        }
    }

    /// Promote to a shared handle.
    ///
    /// Irreversible: the exclusive handle is consumed and the storage moves
    /// into the shared handle unchanged, together with the deleter.
    pub fn into_shared(mut self) -> Result<SharedMessage<T>> {
        let storage = self
            .slot
            .take()
            .ok_or(Error::InvalidArgument("cannot promote a null message handle"))?;
        Ok(SharedMessage::from_parts(storage, self.deleter.clone()))
    }

    /// Copy the payload into new storage from the same allocator.
    pub fn try_clone(&self) -> Result<Self> {
        let value = self
            .get()
            .ok_or(Error::InvalidArgument("cannot copy a null message handle"))?;
        self.deleter.allocate(value.clone())
    }
}

impl<T: Message> Drop for ExclusiveMessage<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: Message + std::fmt::Debug> std::fmt::Debug for ExclusiveMessage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveMessage")
            .field("value", &self.get())
            .finish()
    }
}
