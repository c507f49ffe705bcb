// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish routing integration tests
//!
//! Drives a Publisher against a user-supplied registry to check the routing
//! decisions and ownership handed to each collaborator.

use hdds_publish::{
    Context, ExclusiveMessage, HeapAllocator, InterProcessTransport, IntraProcessRegistry,
    IntraProcessSetting, Ownership, Publisher, PublisherId, Result, SerializedMessage,
    SharedMessage, SubscriberCounts, TransportStatus,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Point {
    x: i32,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Local(Ownership, Point),
    Remote(Point),
}

type Steps = Arc<Mutex<Vec<Step>>>;

struct FixedRegistry {
    counts: SubscriberCounts,
    steps: Steps,
}

impl IntraProcessRegistry<Point> for FixedRegistry {
    fn subscriber_counts(&self, _publisher: PublisherId) -> SubscriberCounts {
        self.counts
    }

    fn deliver_exclusive(&self, _publisher: PublisherId, message: ExclusiveMessage<Point>) -> Result<()> {
        if let Some(value) = message.get() {
            self.steps
                .lock()
                .push(Step::Local(message.ownership(), value.clone()));
        }
        Ok(())
    }

    fn deliver_shared(&self, _publisher: PublisherId, message: SharedMessage<Point>) -> Result<()> {
        self.steps
            .lock()
            .push(Step::Local(message.ownership(), (*message).clone()));
        Ok(())
    }
}

struct StatusTransport {
    status: TransportStatus,
    steps: Steps,
}

impl InterProcessTransport<Point> for StatusTransport {
    fn send(&self, message: &Point) -> TransportStatus {
        self.steps.lock().push(Step::Remote(message.clone()));
        self.status.clone()
    }

    fn send_serialized(&self, _message: &SerializedMessage) -> TransportStatus {
        self.status.clone()
    }
}

struct Fixture {
    publisher: Publisher<Point>,
    heap: Arc<HeapAllocator>,
    steps: Steps,
    _registry: Arc<FixedRegistry>,
}

fn fixture(local: usize, total: usize, status: TransportStatus) -> Fixture {
    let steps = Steps::default();
    let registry = Arc::new(FixedRegistry {
        counts: SubscriberCounts::new(local, total),
        steps: Arc::clone(&steps),
    });
    let heap = Arc::new(HeapAllocator::new());
    let publisher = Publisher::<Point>::builder("/points")
        .with_allocator(Arc::clone(&heap))
        .intra_process(IntraProcessSetting::Enable)
        .with_registry(&registry, PublisherId(7))
        .with_transport(Arc::new(StatusTransport {
            status,
            steps: Arc::clone(&steps),
        }))
        .build()
        .expect("publisher build should succeed");
    Fixture {
        publisher,
        heap,
        steps,
        _registry: registry,
    }
}

#[test]
fn test_only_remote_subscriber_with_transient_failure() {
    let _ = env_logger::builder().is_test(true).try_init();
    let context = Context::new();
    context.shutdown();
    let f = fixture(0, 1, TransportStatus::invalid_publisher(&context));

    f.publisher
        .publish_ref(&Point { x: 1 })
        .expect("transient failure is not reported");
    assert_eq!(
        *f.steps.lock(),
        vec![
            Step::Local(Ownership::Shared, Point { x: 1 }),
            Step::Remote(Point { x: 1 }),
        ]
    );
    assert_eq!(f.heap.stats().live(), 0);
}

#[test]
fn test_all_local_keeps_exclusive_ownership() {
    let f = fixture(2, 2, TransportStatus::Ok);
    let msg = f.publisher.allocate(Point { x: 1 }).expect("alloc");
    f.publisher.publish(msg).expect("publish");

    assert_eq!(
        *f.steps.lock(),
        vec![Step::Local(Ownership::Exclusive, Point { x: 1 })]
    );
}

#[test]
fn test_mixed_population_promotes_once() {
    let f = fixture(1, 3, TransportStatus::Ok);
    f.publisher.publish_ref(&Point { x: 1 }).expect("publish");

    assert_eq!(
        *f.steps.lock(),
        vec![
            Step::Local(Ownership::Shared, Point { x: 1 }),
            Step::Remote(Point { x: 1 }),
        ]
    );
    assert_eq!(f.heap.stats().allocations, 1);
}

#[test]
fn test_hard_failure_after_local_delivery() {
    let f = fixture(1, 2, TransportStatus::PublisherInvalid);
    let err = f
        .publisher
        .publish_ref(&Point { x: 2 })
        .expect_err("invalid publisher on a live context");

    assert_eq!(err.to_string(), "failed to publish message: publisher invalid");
    // Local delivery is not rolled back.
    assert_eq!(f.steps.lock().len(), 2);
}

#[test]
fn test_foreign_message_from_other_allocator() {
    let f = fixture(1, 1, TransportStatus::Ok);
    let foreign = Arc::new(HeapAllocator::new());
    let msg = ExclusiveMessage::new_in(Point { x: 3 }, &foreign).expect("alloc");
    f.publisher.publish(msg).expect("publish");

    // Released through the allocator that created it.
    assert_eq!(foreign.stats().live(), 0);
    assert_eq!(foreign.stats().deallocations, 1);
    assert_eq!(f.heap.stats().allocations, 0);
}
