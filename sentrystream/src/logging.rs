// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging setup via `tracing` + `tracing-subscriber`.
//!
//! The filter defaults to `info` and honors `RUST_LOG` if set, matching the
//! convention used by every CLI in this workspace.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. Safe to call once per process;
/// a second call is a no-op error that callers should ignore.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    let result = if json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}
