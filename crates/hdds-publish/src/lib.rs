// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish routing and ownership transfer.
//!
//! A single `publish` call decides whether a message goes to subscriptions in
//! this process (zero-copy), to the inter-process transport, or to both, and
//! moves ownership of the payload accordingly.
//!
//! ```text
//! caller --> MessageAllocator (by-value publish only)
//!        --> Publisher --+--> IntraProcessRegistry  (local first)
//!                        +--> InterProcessTransport
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hdds_publish::{BufferedSubscription, Context, ContextOptions, EndpointQos, Publisher};
//! use std::sync::Arc;
//!
//! let context = Context::with_options(ContextOptions::new().use_intra_process_comms(true));
//! let manager = context.intra_process_manager().expect("context is live");
//!
//! let sub = Arc::new(BufferedSubscription::<Point>::owning(&EndpointQos::default()));
//! manager.add_subscription::<Point>("/points", EndpointQos::default(), sub.clone());
//!
//! let publisher = Publisher::<Point>::builder("/points")
//!     .with_context(&context)
//!     .with_transport(transport)
//!     .build()?;
//! publisher.publish_ref(&Point { x: 1 })?;
//! assert!(sub.try_take().is_some());
//! ```

pub mod allocator;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod intra_process;
pub mod message;
pub mod publisher;
pub mod qos;
pub mod transport;

pub use allocator::{AllocatorStats, HeapAllocator, MessageAllocator, MessageDeleter, PoolAllocator};
pub use config::{ContextOptions, IntraProcessSetting};
pub use context::Context;
pub use error::{Error, ErrorKind, Result};
pub use events::{
    EventBridge, LivelinessLostStatus, OfferedDeadlineMissedStatus, PublisherEvent,
    PublisherEventCallbacks, PublisherEventKind,
};
pub use intra_process::{
    BufferedSubscription, IntraProcessManager, IntraProcessRegistry, IntraProcessSubscription,
    PublisherId, PublisherRegistration, Received, RegistryLink, SubscriberCounts, SubscriptionId,
};
pub use message::{ExclusiveMessage, Message, Ownership, SerializedMessage, SharedMessage};
pub use publisher::{Publisher, PublisherBuilder, PublisherStats};
pub use qos::{Durability, EndpointQos, Reliability};
pub use transport::{InterProcessTransport, TransportStatus};
