// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated command
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{parse_filter_spec, parse_stream_id, ParseError, SecureArgParser};

use std::path::PathBuf;

use sentrystream_domain::entities::stream_config::{FilterSpec, SourceDescriptor};
use sentrystream_domain::value_objects::ids::StreamId;

/// Validated CLI configuration
///
/// Holds every CLI argument after security validation. All paths are
/// canonicalized and all values are range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub cpu_threads: Option<usize>,
    pub io_threads: Option<usize>,
    pub storage_type: Option<String>,
    pub channel_depth: usize,
}

/// Validated command variants (§6.1)
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Create {
        source: SourceDescriptor,
        capacity_bytes: usize,
        sink: String,
        format: String,
    },
    Destroy {
        stream_id: StreamId,
    },
    List,
    Start {
        stream_id: StreamId,
    },
    Stop {
        stream_id: StreamId,
    },
    AttachFilter {
        stream_id: StreamId,
        filter: FilterSpec,
    },
    Stats {
        stream_id: StreamId,
    },
    Serve {
        metrics_port: Option<u16>,
    },
}

/// Parse and validate CLI arguments
///
/// 1. Parse CLI with clap
/// 2. Validate every path and numeric value with `SecureArgParser`
/// 3. Resolve stream ids and filter specs into their domain types
///
/// # Errors
///
/// Returns `ParseError` if any validation fails
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    if cli.channel_depth == 0 {
        return Err(ParseError::InvalidValue {
            arg: "channel-depth".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if let Some(threads) = cli.cpu_threads {
        if threads == 0 || threads > 128 {
            return Err(ParseError::InvalidValue {
                arg: "cpu-threads".to_string(),
                reason: "must be between 1 and 128".to_string(),
            });
        }
    }

    if let Some(threads) = cli.io_threads {
        if threads == 0 || threads > 256 {
            return Err(ParseError::InvalidValue {
                arg: "io-threads".to_string(),
                reason: "must be between 1 and 256".to_string(),
            });
        }
    }

    let command = match cli.command {
        Commands::Create {
            kind,
            attach_pid,
            spawn,
            args,
            capacity,
            sink,
            format,
        } => {
            if kind != "stdio" {
                return Err(ParseError::InvalidValue {
                    arg: "kind".to_string(),
                    reason: format!("unsupported stream kind '{kind}', only 'stdio' is implemented"),
                });
            }

            let source = match (attach_pid, spawn) {
                (Some(pid), None) => SourceDescriptor::Attach { pid },
                (None, Some(cmd)) => {
                    SecureArgParser::validate_argument(&cmd)?;
                    let mut argv = vec![cmd];
                    argv.extend(args);
                    SourceDescriptor::Spawn { argv }
                }
                (Some(_), Some(_)) => {
                    return Err(ParseError::InvalidValue {
                        arg: "attach-pid/spawn".to_string(),
                        reason: "specify exactly one of --attach-pid or --spawn".to_string(),
                    })
                }
                (None, None) => {
                    return Err(ParseError::InvalidValue {
                        arg: "attach-pid/spawn".to_string(),
                        reason: "one of --attach-pid or --spawn is required".to_string(),
                    })
                }
            };

            if capacity == 0 {
                return Err(ParseError::InvalidValue {
                    arg: "capacity".to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }

            SecureArgParser::validate_argument(&sink)?;
            SecureArgParser::validate_argument(&format)?;

            ValidatedCommand::Create {
                source,
                capacity_bytes: capacity,
                sink,
                format,
            }
        }
        Commands::Destroy { stream_id } => ValidatedCommand::Destroy {
            stream_id: parse_stream_id(&stream_id)?,
        },
        Commands::List => ValidatedCommand::List,
        Commands::Start { stream_id } => ValidatedCommand::Start {
            stream_id: parse_stream_id(&stream_id)?,
        },
        Commands::Stop { stream_id } => ValidatedCommand::Stop {
            stream_id: parse_stream_id(&stream_id)?,
        },
        Commands::AttachFilter { stream_id, filter_spec } => ValidatedCommand::AttachFilter {
            stream_id: parse_stream_id(&stream_id)?,
            filter: parse_filter_spec(&filter_spec)?,
        },
        Commands::Stats { stream_id } => ValidatedCommand::Stats {
            stream_id: parse_stream_id(&stream_id)?,
        },
        Commands::Serve { metrics_port } => ValidatedCommand::Serve { metrics_port },
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
        cpu_threads: cli.cpu_threads,
        io_threads: cli.io_threads,
        storage_type: cli.storage_type,
        channel_depth: cli.channel_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli(command: Commands) -> Cli {
        Cli {
            command,
            verbose: false,
            config: None,
            cpu_threads: None,
            io_threads: None,
            storage_type: None,
            channel_depth: 4,
        }
    }

    #[test]
    fn create_requires_exactly_one_of_attach_pid_or_spawn() {
        let cli = base_cli(Commands::Create {
            kind: "stdio".to_string(),
            attach_pid: None,
            spawn: None,
            args: vec![],
            capacity: 4096,
            sink: "-".to_string(),
            format: "jsonl".to_string(),
        });
        assert!(matches!(validate_cli(cli), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn create_rejects_both_attach_pid_and_spawn() {
        let cli = base_cli(Commands::Create {
            kind: "stdio".to_string(),
            attach_pid: Some(123),
            spawn: Some("/bin/ls".to_string()),
            args: vec![],
            capacity: 4096,
            sink: "-".to_string(),
            format: "jsonl".to_string(),
        });
        assert!(matches!(validate_cli(cli), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn create_with_spawn_builds_source_descriptor() {
        let cli = base_cli(Commands::Create {
            kind: "stdio".to_string(),
            attach_pid: None,
            spawn: Some("/bin/ls".to_string()),
            args: vec!["-la".to_string()],
            capacity: 4096,
            sink: "-".to_string(),
            format: "jsonl".to_string(),
        });
        let validated = validate_cli(cli).unwrap();
        match validated.command {
            ValidatedCommand::Create { source: SourceDescriptor::Spawn { argv }, .. } => {
                assert_eq!(argv, vec!["/bin/ls".to_string(), "-la".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn create_rejects_unsupported_kind() {
        let cli = base_cli(Commands::Create {
            kind: "network".to_string(),
            attach_pid: Some(1),
            spawn: None,
            args: vec![],
            capacity: 4096,
            sink: "-".to_string(),
            format: "jsonl".to_string(),
        });
        assert!(matches!(validate_cli(cli), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn destroy_requires_a_valid_stream_id() {
        let cli = base_cli(Commands::Destroy {
            stream_id: "not-a-uuid".to_string(),
        });
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn zero_channel_depth_is_rejected() {
        let mut cli = base_cli(Commands::List);
        cli.channel_depth = 0;
        assert!(matches!(validate_cli(cli), Err(ParseError::InvalidValue { .. })));
    }
}
