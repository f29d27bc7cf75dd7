// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SentryStream
//!
//! A stream capture, hierarchical analysis, and sink fan-out engine for
//! inspecting a process's standard I/O in real time.
//!
//! ## Architecture
//!
//! The crate follows the same layering as the domain crate it builds on:
//! pure logic and ports live in `sentrystream_domain`; this crate is the
//! infrastructure and application layer that implements those ports against
//! real tokio I/O, and `sentrystream_bootstrap` owns the CLI surface,
//! configuration loading, and process lifecycle.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ Capture (StdioCapture: spawn or attach)                    │
//! │   -> edge Filters -> RingBuffer -> subscriber fan-out       │
//! └──────────────────────────┬────────────────────────────────┘
//!                            │ StreamData
//! ┌──────────────────────────┴────────────────────────────────┐
//! │ Pipeline: S1 edge -> S2 shallow -> S3 deep (consensus)      │
//! │   backed by a content-addressed ResultCache                │
//! └──────────────────────────┬────────────────────────────────┘
//!                            │ Events / Alerts
//! ┌──────────────────────────┴────────────────────────────────┐
//! │ Sink Layer: console, file, tcp, unix, pipe, memory, multi   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orthogonally, the Feedback-Loop Controller samples metrics at 100 Hz and
//! fires regulating actions per level, and the Bypass Channel guarantees a
//! 100 ms response path for a small set of critical signal kinds.

pub mod analyzers;
pub mod application;
pub mod buffer;
pub mod bypass;
pub mod capture;
pub mod config;
pub mod control;
pub mod error;
pub mod feedback;
pub mod filters;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod pipeline;
pub mod sinks;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

pub use error::{EngineError, EngineResult};
