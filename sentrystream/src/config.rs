// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Layered configuration: built-in defaults, an optional TOML file, then
//! `SENTRYSTREAM_*` environment overrides, in that order of precedence.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub ring_capacity_bytes: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            ring_capacity_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub tick_hz: u32,
    pub bypass_sla_millis: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            tick_hz: 100,
            bypass_sla_millis: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

/// Top-level configuration for the capture/analysis/sink engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub buffer: BufferConfig,
    pub feedback: FeedbackConfig,
    pub metrics: MetricsConfig,
    pub default_rate_limit_per_second: u32,
    pub entropy_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            feedback: FeedbackConfig::default(),
            metrics: MetricsConfig::default(),
            default_rate_limit_per_second: 1000,
            entropy_threshold: 7.5,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from built-in defaults, an optional file at
    /// `path`, and `SENTRYSTREAM_*` environment variables, in ascending
    /// precedence.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let defaults = EngineConfig::default();
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&defaults)?);

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SENTRYSTREAM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize().map_err(EngineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = EngineConfig::load(None).unwrap();
        assert_eq!(cfg.feedback.tick_hz, 100);
        assert_eq!(cfg.metrics.port, 9090);
    }

    #[test]
    fn env_overrides_take_precedence() {
        std::env::set_var("SENTRYSTREAM__METRICS__PORT", "9999");
        let cfg = EngineConfig::load(None).unwrap();
        std::env::remove_var("SENTRYSTREAM__METRICS__PORT");
        assert_eq!(cfg.metrics.port, 9999);
    }
}
