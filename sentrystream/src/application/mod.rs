// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The application layer: `EngineService` wires the Stream Manager, the
//! per-stream Pipeline, and the Sink Layer together behind the operations
//! the control CLI exposes (§6.1).

pub mod service;

pub use service::EngineService;
