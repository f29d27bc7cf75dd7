// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap.
//!
//! This module defines the CLI structure and handles argument parsing.
//! Security validation happens in the validator module after parsing.

use clap::{Parser, Subcommand};

/// Main CLI structure
#[derive(Parser, Debug, Clone)]
#[command(name = "sentrystream")]
#[command(about = concat!("SentryStream v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Override the worker thread count used for pipeline processing
    #[arg(long)]
    pub cpu_threads: Option<usize>,

    /// Override the worker thread count used for sink I/O
    #[arg(long)]
    pub io_threads: Option<usize>,

    /// Storage backend hint, currently unused but reserved for a future sink
    #[arg(long)]
    pub storage_type: Option<String>,

    /// Channel depth between the capture's ring buffer and pipeline stages
    #[arg(long, default_value = "4")]
    pub channel_depth: usize,
}

/// CLI subcommands (§6.1)
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a stream and start analyzing it once started
    Create {
        /// Transport kind; only "stdio" is implemented
        #[arg(long, default_value = "stdio")]
        kind: String,

        /// Attach to an already-running process by pid
        #[arg(long, conflicts_with = "spawn")]
        attach_pid: Option<u32>,

        /// Spawn a new process and capture it from birth
        #[arg(long)]
        spawn: Option<String>,

        /// Extra argv entries for --spawn, given after `--`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Ring buffer capacity in bytes
        #[arg(long, default_value = "1048576")]
        capacity: usize,

        /// Sink destination string, e.g. "file:/var/log/sentrystream.jsonl"
        #[arg(long, default_value = "-")]
        sink: String,

        /// Sink output format: json, jsonl, or cef
        #[arg(long, default_value = "jsonl")]
        format: String,
    },

    /// Destroy a stream, releasing its pipeline and sink
    Destroy {
        /// Stream id returned by `create`
        stream_id: String,
    },

    /// List every live stream id
    List,

    /// Start capturing on a created stream
    Start {
        stream_id: String,
    },

    /// Stop capturing on a running stream
    Stop {
        stream_id: String,
    },

    /// Attach an additional edge filter to a stream
    AttachFilter {
        stream_id: String,
        /// See `parse_filter_spec` for the grammar
        filter_spec: String,
    },

    /// Print a stream's capture statistics
    Stats {
        stream_id: String,
    },

    /// Run the manager, feedback controller, and bypass channel in the foreground
    Serve {
        /// Port the Prometheus metrics endpoint listens on
        #[arg(long)]
        metrics_port: Option<u16>,
    },
}

/// Parse CLI arguments
///
/// # Panics
///
/// Clap exits the process with a usage message if parsing fails.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
