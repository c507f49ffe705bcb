// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message ownership model.
//!
//! A message is reachable through exactly one of two handle kinds:
//!
//! - [`ExclusiveMessage`]: single owner, may be null, released through the
//!   allocator binding when dropped.
//! - [`SharedMessage`]: reference counted, read-only, released through the
//!   same binding when the last clone goes away.
//!
//! [`ExclusiveMessage::into_shared`] is the only way from one kind to the
//! other. It consumes the exclusive handle and keeps the storage in place, so
//! promotion never copies the payload.
//!
//! Pre-serialized payloads travel as [`SerializedMessage`] and never enter the
//! allocator.

mod exclusive;
mod serialized;
mod shared;

pub use exclusive::ExclusiveMessage;
pub use serialized::SerializedMessage;
pub use shared::SharedMessage;

/// Capability set required from a publishable message type.
///
/// Blanket-implemented for every `Clone + Send + Sync + 'static` type: the
/// router copies on by-value publish and the registry copies when several
/// local subscriptions each want ownership.
pub trait Message: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Message for T {}

/// Which handle kind currently owns a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Exclusive,
    Shared,
}
