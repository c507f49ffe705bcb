// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process context.
//!
//! The context is the only strong owner of the [`IntraProcessManager`].
//! Publishers hold weak links to it, so [`Context::shutdown`] is enough to
//! make every outstanding publish fail with
//! [`Error::RegistryUnavailable`](crate::Error::RegistryUnavailable) on its
//! local path.

use crate::allocator::PoolAllocator;
use crate::config::ContextOptions;
use crate::error::Result;
use crate::intra_process::IntraProcessManager;
use crate::message::Message;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Context {
    valid: AtomicBool,
    intra_process: ArcSwapOption<IntraProcessManager>,
    options: ContextOptions,
}

impl Context {
    /// Context with default options.
    pub fn new() -> Arc<Self> {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Arc<Self> {
        log::debug!(
            "[context] init (intra_process default={})",
            options.intra_process
        );
        Arc::new(Self {
            valid: AtomicBool::new(true),
            intra_process: ArcSwapOption::from_pointee(IntraProcessManager::new()),
            options,
        })
    }

    /// Context configured from `HDDS_*` environment variables.
    pub fn from_env() -> Result<Arc<Self>> {
        let options = ContextOptions::from_env()?;
        options.apply_log_level();
        Ok(Self::with_options(options))
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Invalidate the context and drop its intra-process manager.
    ///
    /// Idempotent. Publishers created from this context keep working for
    /// inter-process delivery only until the transport reports them invalid.
    pub fn shutdown(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            self.intra_process.store(None);
            log::debug!("[context] shut down");
        }
    }

    /// Strong handle to the manager, `None` after shutdown.
    pub fn intra_process_manager(&self) -> Option<Arc<IntraProcessManager>> {
        self.intra_process.load_full()
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Pool allocator sized from [`ContextOptions::pool_capacity`].
    pub fn pool_allocator<T: Message>(&self) -> Arc<PoolAllocator<T>> {
        Arc::new(PoolAllocator::new(self.options.pool_capacity))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("valid", &self.is_valid())
            .field("options", &self.options)
            .finish()
    }
}
