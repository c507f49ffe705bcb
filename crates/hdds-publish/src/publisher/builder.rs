// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builder pattern for Publisher configuration.
//!
//! The allocator, the intra-process registration and the event handlers are
//! all fixed here; a built publisher never changes them.

use super::runtime::{IntraProcessRoute, Publisher};
use crate::allocator::{HeapAllocator, MessageAllocator};
use crate::config::IntraProcessSetting;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::events::{EventBridge, PublisherEventCallbacks};
use crate::intra_process::{IntraProcessRegistry, PublisherId, RegistryLink};
use crate::message::Message;
use crate::qos::EndpointQos;
use crate::transport::InterProcessTransport;
use std::sync::Arc;

pub struct PublisherBuilder<T: Message, A: MessageAllocator<T> = HeapAllocator> {
    topic: String,
    qos: EndpointQos,
    allocator: Arc<A>,
    context: Option<Arc<Context>>,
    intra_process: IntraProcessSetting,
    registry: Option<RegistryLink<T>>,
    transport: Option<Arc<dyn InterProcessTransport<T>>>,
    callbacks: PublisherEventCallbacks,
}

impl<T: Message> PublisherBuilder<T, HeapAllocator> {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            qos: EndpointQos::default(),
            allocator: Arc::new(HeapAllocator::new()),
            context: None,
            intra_process: IntraProcessSetting::default(),
            registry: None,
            transport: None,
            callbacks: PublisherEventCallbacks::default(),
        }
    }
}

impl<T: Message, A: MessageAllocator<T>> PublisherBuilder<T, A> {
    pub fn qos(mut self, qos: EndpointQos) -> Self {
        self.qos = qos;
        self
    }

    /// Use `allocator` for every message this publisher constructs.
    pub fn with_allocator<B: MessageAllocator<T>>(self, allocator: Arc<B>) -> PublisherBuilder<T, B> {
        PublisherBuilder {
            topic: self.topic,
            qos: self.qos,
            allocator,
            context: self.context,
            intra_process: self.intra_process,
            registry: self.registry,
            transport: self.transport,
            callbacks: self.callbacks,
        }
    }

    /// Register with the intra-process manager owned by `context`.
    pub fn with_context(mut self, context: &Arc<Context>) -> Self {
        self.context = Some(Arc::clone(context));
        self
    }

    /// - `Enable`: always deliver locally
    /// - `Disable`: inter-process only, nothing is allocated by `publish_ref`
    /// - `ContextDefault` (default): follow the context options
    pub fn intra_process(mut self, setting: IntraProcessSetting) -> Self {
        self.intra_process = setting;
        self
    }

    /// Use an explicit registry instead of the context manager.
    ///
    /// The publisher keeps only a weak reference; `id` must already be known
    /// to `registry`.
    pub fn with_registry<R>(mut self, registry: &Arc<R>, id: PublisherId) -> Self
    where
        R: IntraProcessRegistry<T> + 'static,
    {
        self.registry = Some(RegistryLink::new(registry, id));
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn InterProcessTransport<T>>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_event_callbacks(mut self, callbacks: PublisherEventCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    fn resolve_intra_process(&self) -> Result<bool> {
        let context_default = self
            .context
            .as_ref()
            .map_or(false, |context| context.options().intra_process);
        let enabled = self.intra_process.resolve(context_default);

        if self.registry.is_some() && self.intra_process == IntraProcessSetting::Disable {
            return Err(Error::Config(format!(
                "publisher '{}': registry supplied but intra-process delivery disabled",
                self.topic
            )));
        }
        Ok(enabled || self.registry.is_some())
    }

    pub fn build(self) -> Result<Publisher<T, A>> {
        let enabled = self.resolve_intra_process()?;
        let transport = self.transport.ok_or_else(|| {
            Error::Config(format!(
                "publisher '{}' has no inter-process transport",
                self.topic
            ))
        })?;

        let route = match (enabled, self.registry, self.context.as_ref()) {
            (false, _, _) => None,
            (true, Some(link), _) => Some(IntraProcessRoute {
                link,
                _registration: None,
            }),
            (true, None, Some(context)) => {
                let manager = context
                    .intra_process_manager()
                    .ok_or(Error::RegistryUnavailable)?;
                let registration = manager.register_publisher::<T>(&self.topic, self.qos);
                Some(IntraProcessRoute {
                    link: RegistryLink::new(&manager, registration.id()),
                    _registration: Some(registration),
                })
            }
            (true, None, None) => {
                return Err(Error::Config(format!(
                    "publisher '{}': intra-process delivery needs a context or a registry",
                    self.topic
                )))
            }
        };

        log::debug!(
            "[publisher] created '{}' intra_process={} events={:?}",
            self.topic,
            route.is_some(),
            self.callbacks
        );

        Ok(Publisher::from_parts(
            self.topic,
            self.qos,
            self.allocator,
            route,
            transport,
            EventBridge::register(self.callbacks),
        ))
    }
}
