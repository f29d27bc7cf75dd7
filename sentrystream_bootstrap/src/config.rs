// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Bootstrap-phase configuration structure.
//!
//! ## Design Philosophy
//!
//! `AppConfig` holds **validated** configuration after:
//! 1. Command-line argument parsing
//! 2. Security validation
//! 3. Environment variable / config-file resolution
//! 4. Default value application
//!
//! ## Immutability
//!
//! All configuration is **immutable** after creation, so it can be shared
//! across async tasks without synchronization.
//!
//! ## Usage
//!
//! ```rust
//! use sentrystream_bootstrap::config::{AppConfig, LogLevel};
//!
//! let config = AppConfig::builder().log_level(LogLevel::Info).entropy_threshold(7.5).build();
//!
//! println!("Running: {}", config.app_name());
//! ```

use std::path::PathBuf;

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    /// Convert to a `tracing` level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Application configuration
///
/// Immutable configuration holding the bootstrap-phase and engine-tuning
/// settings the `serve` command and the per-stream pipeline draw from.
#[derive(Debug, Clone)]
pub struct AppConfig {
    app_name: String,
    log_level: LogLevel,
    config_path: Option<PathBuf>,

    /// Shannon-entropy threshold the deep-stage entropy analyzer trips at.
    entropy_threshold: f64,
    /// Whether the deep stage blocks (`true`) or only records findings.
    enforcing: bool,
    /// Default token-bucket rate applied when a stream names no filters.
    default_rate_limit_per_sec: u32,
    /// Port the `serve` command's metrics endpoint listens on.
    metrics_port: Option<u16>,

    verbose: bool,
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn entropy_threshold(&self) -> f64 {
        self.entropy_threshold
    }

    pub fn enforcing(&self) -> bool {
        self.enforcing
    }

    pub fn default_rate_limit_per_sec(&self) -> u32 {
        self.default_rate_limit_per_sec
    }

    pub fn metrics_port(&self) -> Option<u16> {
        self.metrics_port
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Builder for `AppConfig`
#[derive(Debug)]
pub struct AppConfigBuilder {
    app_name: String,
    log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
    entropy_threshold: f64,
    enforcing: bool,
    default_rate_limit_per_sec: u32,
    metrics_port: Option<u16>,
    verbose: bool,
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            app_name: "sentrystream".to_string(),
            log_level: None,
            config_path: None,
            entropy_threshold: 7.5,
            enforcing: true,
            default_rate_limit_per_sec: 1000,
            metrics_port: None,
            verbose: false,
        }
    }
}

impl AppConfigBuilder {
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn entropy_threshold(mut self, threshold: f64) -> Self {
        self.entropy_threshold = threshold;
        self
    }

    pub fn enforcing(mut self, enforcing: bool) -> Self {
        self.enforcing = enforcing;
        self
    }

    pub fn default_rate_limit_per_sec(mut self, rate: u32) -> Self {
        self.default_rate_limit_per_sec = rate;
        self
    }

    pub fn metrics_port(mut self, port: u16) -> Self {
        self.metrics_port = Some(port);
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn build(self) -> AppConfig {
        AppConfig {
            app_name: self.app_name,
            log_level: self.log_level.unwrap_or_default(),
            config_path: self.config_path,
            entropy_threshold: self.entropy_threshold,
            enforcing: self.enforcing,
            default_rate_limit_per_sec: self.default_rate_limit_per_sec,
            metrics_port: self.metrics_port,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_sane() {
        let config = AppConfig::builder().build();
        assert_eq!(config.app_name(), "sentrystream");
        assert_eq!(config.log_level(), LogLevel::Info);
        assert!(config.enforcing());
        assert_eq!(config.default_rate_limit_per_sec(), 1000);
        assert!(config.metrics_port().is_none());
    }

    #[test]
    fn builder_applies_overrides() {
        let config = AppConfig::builder().log_level(LogLevel::Debug).entropy_threshold(6.0).enforcing(false).metrics_port(9000).verbose(true).build();

        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.entropy_threshold(), 6.0);
        assert!(!config.enforcing());
        assert_eq!(config.metrics_port(), Some(9000));
        assert!(config.is_verbose());
    }

    #[test]
    fn log_level_maps_to_tracing() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
