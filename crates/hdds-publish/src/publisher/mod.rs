// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Publisher
//!
//! The [`Publisher`] routes typed messages to local subscriptions, to the
//! inter-process transport, or to both, and moves message ownership along.
//!
//! ## Example
//!
//! ```ignore
//! use hdds_publish::{Context, ContextOptions, Publisher};
//!
//! let context = Context::with_options(ContextOptions::new().use_intra_process_comms(true));
//! let publisher = Publisher::<Point>::builder("/points")
//!     .with_context(&context)
//!     .with_transport(transport)
//!     .build()?;
//!
//! publisher.publish_ref(&Point { x: 1 })?;
//! let msg = publisher.allocate(Point { x: 2 })?;
//! publisher.publish(msg)?;
//! ```
//!
//! ## Delivery Path
//!
//! ```text
//! publish_ref(&T) --(intra off)--------------------------> transport.send(&T)
//!        |
//!        +--(intra on) allocate copy --> publish(Exclusive)
//!
//! publish(Exclusive) -+- intra off ----------------------> transport.send(&T)
//!                     |
//!                     +- total > local: into_shared --> registry.deliver_shared
//!                     |                             \--> transport.send(&shared)
//!                     |
//!                     +- total == local --------------> registry.deliver_exclusive
//!
//! publish_serialized(&bytes) -- intra off -------------> transport.send_serialized
//! ```

mod builder;
mod runtime;

pub use builder::PublisherBuilder;
pub use runtime::{Publisher, PublisherStats};
