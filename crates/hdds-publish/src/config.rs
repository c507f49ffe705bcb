// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Context options and per-publisher settings.
//!
//! Options can be built in code or read from environment variables:
//!
//! - `HDDS_INTRA_PROCESS`: default intra-process setting for publishers
//!   ("1"/"true" or "0"/"false", default: disabled)
//! - `HDDS_LOG_LEVEL`: logging level (default: "info"), see
//!   [`ContextOptions::apply_log_level`]
//! - `HDDS_POOL_CAPACITY`: free-list capacity of pools created by
//!   [`Context::pool_allocator`](crate::Context::pool_allocator) (default: 64)
//!
//! # Example
//!
//! ```bash
//! export HDDS_INTRA_PROCESS=1
//! export HDDS_LOG_LEVEL=debug
//! export HDDS_POOL_CAPACITY=256
//! ```

use crate::allocator::DEFAULT_POOL_CAPACITY;
use crate::error::{Error, Result};
use std::env;

pub const ENV_INTRA_PROCESS: &str = "HDDS_INTRA_PROCESS";
pub const ENV_LOG_LEVEL: &str = "HDDS_LOG_LEVEL";
pub const ENV_POOL_CAPACITY: &str = "HDDS_POOL_CAPACITY";

/// Whether a publisher uses the same-process fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntraProcessSetting {
    Enable,
    Disable,
    /// Follow [`ContextOptions::intra_process`].
    #[default]
    ContextDefault,
}

impl IntraProcessSetting {
    pub fn resolve(self, context_default: bool) -> bool {
        match self {
            IntraProcessSetting::Enable => true,
            IntraProcessSetting::Disable => false,
            IntraProcessSetting::ContextDefault => context_default,
        }
    }
}

/// Runtime options of a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Default for publishers built with [`IntraProcessSetting::ContextDefault`].
    pub intra_process: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Free-list capacity for context-created pool allocators.
    pub pool_capacity: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            intra_process: false,
            log_level: "info".to_string(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(Error::Config(format!(
            "{}: expected 1/0/true/false, got '{}'",
            name, other
        ))),
    }
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn use_intra_process_comms(mut self, enabled: bool) -> Self {
        self.intra_process = enabled;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[must_use]
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Load options from environment variables.
    ///
    /// Unset or empty variables keep their defaults; malformed values are a
    /// [`Error::Config`].
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Some(value) = env::var(ENV_INTRA_PROCESS).ok().filter(|s| !s.is_empty()) {
            options.intra_process = parse_flag(ENV_INTRA_PROCESS, &value)?;
        }

        if let Some(level) = env::var(ENV_LOG_LEVEL).ok().filter(|s| !s.is_empty()) {
            options.log_level = level;
        }

        if let Some(value) = env::var(ENV_POOL_CAPACITY).ok().filter(|s| !s.is_empty()) {
            options.pool_capacity = value.trim().parse::<usize>().map_err(|e| {
                Error::Config(format!("{}: '{}' is not a capacity ({})", ENV_POOL_CAPACITY, value, e))
            })?;
        }

        log::debug!(
            "[context] options from env: intra_process={} log_level={} pool_capacity={}",
            options.intra_process,
            options.log_level,
            options.pool_capacity
        );
        Ok(options)
    }

    /// Apply log level to the logging subsystem
    pub fn apply_log_level(&self) {
        if let Err(e) = env::var("RUST_LOG") {
            // Only set if RUST_LOG is not already set
            if e == env::VarError::NotPresent {
                env::set_var("RUST_LOG", &self.log_level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ContextOptions::default();
        assert!(!options.intra_process);
        assert_eq!(options.log_level, "info");
        assert_eq!(options.pool_capacity, DEFAULT_POOL_CAPACITY);
    }

    #[test]
    fn test_setting_resolution() {
        assert!(IntraProcessSetting::Enable.resolve(false));
        assert!(!IntraProcessSetting::Disable.resolve(true));
        assert!(IntraProcessSetting::ContextDefault.resolve(true));
        assert!(!IntraProcessSetting::ContextDefault.resolve(false));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "TRUE").expect("valid"));
        assert!(!parse_flag("X", " 0 ").expect("valid"));
        let err = parse_flag("X", "maybe").expect_err("invalid");
        assert!(matches!(err, Error::Config(_)));
    }

    // Env vars are process-global, so every env case lives in one test.
    #[test]
    fn test_from_env() {
        let prev: Vec<_> = [ENV_INTRA_PROCESS, ENV_LOG_LEVEL, ENV_POOL_CAPACITY]
            .iter()
            .map(|name| (*name, env::var(name).ok()))
            .collect();

        env::set_var(ENV_INTRA_PROCESS, "true");
        env::set_var(ENV_LOG_LEVEL, "debug");
        env::set_var(ENV_POOL_CAPACITY, "256");
        let options = ContextOptions::from_env().expect("valid env");
        assert!(options.intra_process);
        assert_eq!(options.log_level, "debug");
        assert_eq!(options.pool_capacity, 256);

        env::set_var(ENV_POOL_CAPACITY, "lots");
        let err = ContextOptions::from_env().expect_err("bad capacity");
        assert!(matches!(err, Error::Config(_)));

        env::set_var(ENV_POOL_CAPACITY, "");
        env::set_var(ENV_INTRA_PROCESS, "off");
        assert!(ContextOptions::from_env().is_err());

        // Restore
        for (name, value) in prev {
            match value {
                Some(v) => env::set_var(name, v),
                None => env::remove_var(name),
            }
        }
    }
}
