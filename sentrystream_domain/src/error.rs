// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain-level error type.
//!
//! Mirrors the category split in the error handling design: configuration
//! errors are fatal at construction time, resource-acquisition errors abort a
//! `start()`, and everything else is either counted (transient) or bubbled up
//! for the caller to decide.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("malformed destination string: {0}")]
    MalformedDestination(String),

    #[error("unknown sink kind: {0}")]
    UnknownSinkKind(String),

    #[error("resource acquisition failed: {0}")]
    ResourceAcquisition(String),

    #[error("already started")]
    AlreadyStarted,

    #[error("unknown subscriber id: {0}")]
    UnknownSubscriber(String),

    #[error("unknown filter name: {0}")]
    UnknownFilter(String),

    #[error("stream not found: {0}")]
    StreamNotFound(String),

    #[error("stream already exists: {0}")]
    StreamAlreadyExists(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("analyzer error: {0}")]
    AnalyzerError(String),

    #[error("bypass channel unavailable: {0}")]
    BypassUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}

impl From<regex::Error> for DomainError {
    fn from(e: regex::Error) -> Self {
        DomainError::InvalidConfiguration(format!("bad pattern: {e}"))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("serialization error: {e}"))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
