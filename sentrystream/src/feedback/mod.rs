// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Feedback-Loop Controller and its catalogue of per-level loops
//! (§4.8), and the scalar gauges those loops read and adjust.

pub mod catalogue;
pub mod controller;
pub mod loop_def;
pub mod scalars;

pub use catalogue::default_loops;
pub use controller::{FeedbackController, LoopTelemetry, SystemTelemetry};
pub use loop_def::{ClosureLoop, FeedbackLoop, Level};
pub use scalars::{AtomicF64, ScalarMetrics};
