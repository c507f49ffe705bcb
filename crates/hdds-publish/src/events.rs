// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher event callbacks.
//!
//! Handlers are supplied once at publisher construction through
//! [`PublisherEventCallbacks`] and live as long as the publisher. The bridge
//! only forwards: no retries, no filtering, no re-registration.
//!
//! # Example
//!
//! ```ignore
//! let callbacks = PublisherEventCallbacks::new()
//!     .on_deadline_missed(|status| {
//!         log::warn!("deadline missed {} times", status.total_count);
//!     });
//! let publisher = Publisher::<Point>::builder("/points")
//!     .with_event_callbacks(callbacks)
//!     .with_transport(transport)
//!     .build()?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

/// Kinds of publisher events that can carry a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublisherEventKind {
    OfferedDeadlineMissed,
    LivelinessLost,
}

/// Status information for offered deadline missed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferedDeadlineMissedStatus {
    /// Total cumulative count of missed deadlines.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
}

/// Status information for liveliness lost events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivelinessLostStatus {
    /// Total cumulative count of liveliness losses.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
}

/// Event occurrence reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherEvent {
    OfferedDeadlineMissed(OfferedDeadlineMissedStatus),
    LivelinessLost(LivelinessLostStatus),
}

impl PublisherEvent {
    pub fn kind(&self) -> PublisherEventKind {
        match self {
            PublisherEvent::OfferedDeadlineMissed(_) => PublisherEventKind::OfferedDeadlineMissed,
            PublisherEvent::LivelinessLost(_) => PublisherEventKind::LivelinessLost,
        }
    }
}

type DeadlineCallback = Arc<dyn Fn(&OfferedDeadlineMissedStatus) + Send + Sync>;
type LivelinessCallback = Arc<dyn Fn(&LivelinessLostStatus) + Send + Sync>;

/// User handlers passed to the publisher builder. Both are optional.
#[derive(Clone, Default)]
pub struct PublisherEventCallbacks {
    pub deadline_callback: Option<DeadlineCallback>,
    pub liveliness_callback: Option<LivelinessCallback>,
}

impl PublisherEventCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_deadline_missed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&OfferedDeadlineMissedStatus) + Send + Sync + 'static,
    {
        self.deadline_callback = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_liveliness_lost<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LivelinessLostStatus) + Send + Sync + 'static,
    {
        self.liveliness_callback = Some(Arc::new(callback));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.deadline_callback.is_none() && self.liveliness_callback.is_none()
    }
}

impl std::fmt::Debug for PublisherEventCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherEventCallbacks")
            .field("deadline", &self.deadline_callback.is_some())
            .field("liveliness", &self.liveliness_callback.is_some())
            .finish()
    }
}

enum Handler {
    Deadline(DeadlineCallback),
    Liveliness(LivelinessCallback),
}

/// Per-publisher table of event handlers, one per kind.
#[derive(Default)]
pub struct EventBridge {
    handlers: HashMap<PublisherEventKind, Handler>,
}

impl EventBridge {
    pub(crate) fn register(callbacks: PublisherEventCallbacks) -> Self {
        let mut handlers = HashMap::new();
        if let Some(cb) = callbacks.deadline_callback {
            handlers.insert(PublisherEventKind::OfferedDeadlineMissed, Handler::Deadline(cb));
        }
        if let Some(cb) = callbacks.liveliness_callback {
            handlers.insert(PublisherEventKind::LivelinessLost, Handler::Liveliness(cb));
        }
        Self { handlers }
    }

    pub fn is_registered(&self, kind: PublisherEventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn registered_kinds(&self) -> Vec<PublisherEventKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Forward `event` to its handler. Returns false when none is registered.
    pub fn notify(&self, event: &PublisherEvent) -> bool {
        match (self.handlers.get(&event.kind()), event) {
            (Some(Handler::Deadline(cb)), PublisherEvent::OfferedDeadlineMissed(status)) => {
                cb(status);
                true
            }
            (Some(Handler::Liveliness(cb)), PublisherEvent::LivelinessLost(status)) => {
                cb(status);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("kinds", &self.registered_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_only_supplied_handlers_registered() {
        let bridge = EventBridge::register(PublisherEventCallbacks::new().on_liveliness_lost(|_| {}));
        assert!(bridge.is_registered(PublisherEventKind::LivelinessLost));
        assert!(!bridge.is_registered(PublisherEventKind::OfferedDeadlineMissed));
        assert_eq!(bridge.registered_kinds(), vec![PublisherEventKind::LivelinessLost]);

        let empty = EventBridge::register(PublisherEventCallbacks::default());
        assert!(empty.registered_kinds().is_empty());
    }

    #[test]
    fn test_notify_forwards_status() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_cb = Arc::clone(&seen);
        let bridge = EventBridge::register(PublisherEventCallbacks::new().on_deadline_missed(
            move |status| {
                seen_cb.store(status.total_count, Ordering::SeqCst);
            },
        ));

        let delivered = bridge.notify(&PublisherEvent::OfferedDeadlineMissed(
            OfferedDeadlineMissedStatus {
                total_count: 3,
                total_count_change: 1,
            },
        ));
        assert!(delivered);
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        let unhandled = bridge.notify(&PublisherEvent::LivelinessLost(LivelinessLostStatus::default()));
        assert!(!unhandled);
    }
}
