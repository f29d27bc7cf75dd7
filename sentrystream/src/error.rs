// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Engine-level error type. Wraps the domain error plus the infrastructure
//! failure modes the domain layer has no business knowing about (bind
//! failures, process spawn failures, metrics registration).

use sentrystream_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("process control error: {0}")]
    Process(String),

    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("sink '{0}' is unavailable: {1}")]
    SinkUnavailable(String, String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(e: config::ConfigError) -> Self {
        EngineError::Config(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
