// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

pub mod stdio;
pub mod syscall_trace;

pub use stdio::StdioCapture;
pub use syscall_trace::{ParsedSyscall, SyscallTraceParser, TraceSource};
