// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Command-Line Argument Parsing
//!
//! Security-first argument parsing with comprehensive validation.
//!
//! ## Security Features
//!
//! - **Length limits** - Prevent buffer overflow attempts
//! - **Pattern detection** - Block path traversal and injection
//! - **Path normalization** - Canonical path resolution
//! - **System directory protection** - Prevent access to sensitive paths
//!
//! ## Dangerous Patterns Detected
//!
//! - `..` - Path traversal
//! - `~` - Home directory expansion (security risk)
//! - `$` - Variable expansion
//! - Backticks - Command substitution
//! - `;` `&` `|` - Command chaining
//! - `>` `<` - Redirection
//! - Null bytes, newlines, carriage returns

use std::path::{Path, PathBuf};

use thiserror::Error;

use sentrystream_domain::entities::stream_config::FilterSpec;
use sentrystream_domain::value_objects::ids::StreamId;

/// Maximum single argument length
const MAX_ARG_LENGTH: usize = 1000;

/// Maximum path length
const MAX_PATH_LENGTH: usize = 4096;

/// Dangerous patterns that indicate potential attacks
const DANGEROUS_PATTERNS: &[&str] = &[
    "..", // Path traversal
    "~",  // Home directory
    "$",  // Variable expansion
    "`",  // Command substitution
    ";",  // Command chaining
    "&",  // Background/AND
    "|",  // Pipe
    ">",  // Redirect output
    "<",  // Redirect input
    "\n", // Newline
    "\r", // Carriage return
    "\0", // Null byte
];

/// Protected system directories
const PROTECTED_DIRS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev"];

/// Secure argument parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// Argument exceeds maximum length
    #[error("Argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    /// Dangerous pattern detected
    #[error("Dangerous pattern detected in argument: {pattern} in {arg}")]
    DangerousPattern { pattern: String, arg: String },

    /// Path too long
    #[error("Path exceeds maximum length (max {MAX_PATH_LENGTH})")]
    PathTooLong,

    /// Attempted access to protected system directory
    #[error("Access to protected system directory denied: {0}")]
    ProtectedDirectory(String),

    /// Path does not exist
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid argument value
    #[error("Invalid argument value for {arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// Secure argument parser
///
/// Provides security-first validation for every CLI argument, ahead of the
/// command-specific validation in [`crate::cli::validate_cli`].
pub struct SecureArgParser;

impl SecureArgParser {
    /// Validate a single argument for security issues
    pub fn validate_argument(arg: &str) -> Result<(), ParseError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ParseError::ArgumentTooLong(arg.chars().take(50).collect::<String>() + "..."));
        }

        for pattern in DANGEROUS_PATTERNS {
            if arg.contains(pattern) {
                return Err(ParseError::DangerousPattern {
                    pattern: pattern.to_string(),
                    arg: arg.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validate and canonicalize a path that must already exist
    pub fn validate_path(path: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(path).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidPath(format!("Path too long: {path}")),
            ParseError::DangerousPattern { pattern, .. } => ParseError::InvalidPath(format!("Path contains dangerous pattern '{pattern}': {path}")),
            other => other,
        })?;

        let path_obj = Path::new(path);
        let canonical = path_obj.canonicalize().map_err(|e| {
            if !path_obj.exists() {
                ParseError::PathNotFound(path.to_string())
            } else {
                ParseError::InvalidPath(format!("{path}: {e}"))
            }
        })?;

        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ParseError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ParseError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(canonical)
    }

    /// Validate an optional path (may be `None`)
    pub fn validate_optional_path(path: Option<&str>) -> Result<Option<PathBuf>, ParseError> {
        match path {
            Some(p) => Self::validate_path(p).map(Some),
            None => Ok(None),
        }
    }

    /// Validate a numeric argument against an optional range
    pub fn validate_number<T>(arg_name: &str, value: &str, min: Option<T>, max: Option<T>) -> Result<T, ParseError>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
    {
        Self::validate_argument(value)?;

        let num = value.parse::<T>().map_err(|_| ParseError::InvalidValue {
            arg: arg_name.to_string(),
            reason: format!("Not a valid number: {value}"),
        })?;

        if let Some(min_val) = min {
            if num < min_val {
                return Err(ParseError::InvalidValue {
                    arg: arg_name.to_string(),
                    reason: format!("Value {value} is less than minimum {min_val}"),
                });
            }
        }

        if let Some(max_val) = max {
            if num > max_val {
                return Err(ParseError::InvalidValue {
                    arg: arg_name.to_string(),
                    reason: format!("Value {value} is greater than maximum {max_val}"),
                });
            }
        }

        Ok(num)
    }
}

/// Parses a `<stream-id>` CLI argument into a `StreamId`.
pub fn parse_stream_id(arg: &str) -> Result<StreamId, ParseError> {
    SecureArgParser::validate_argument(arg)?;
    arg.parse::<StreamId>().map_err(|_| ParseError::InvalidValue {
        arg: "stream-id".to_string(),
        reason: format!("not a valid stream id: {arg}"),
    })
}

/// Parses a `<filter-spec>` CLI argument into a `FilterSpec`.
///
/// Grammar (colon-separated, list fields pipe-separated):
///
/// ```text
/// regex:<name>:<pattern>[|<pattern>...]
/// keyword:<name>:<ci|cs>:<keyword>[|<keyword>...]
/// length:<name>:<max_bytes>
/// ratelimit:<name>:<tokens_per_sec>:<burst>
/// entropy:<name>:<threshold>
/// ```
pub fn parse_filter_spec(arg: &str) -> Result<FilterSpec, ParseError> {
    SecureArgParser::validate_argument(arg)?;
    let mut parts = arg.splitn(3, ':');
    let kind = parts.next().unwrap_or_default();
    let name = parts
        .next()
        .ok_or_else(|| invalid_filter_spec(arg, "missing filter name"))?
        .to_string();
    let rest = parts.next().ok_or_else(|| invalid_filter_spec(arg, "missing filter parameters"))?;

    match kind {
        "regex" => Ok(FilterSpec::Regex {
            name,
            patterns: rest.split('|').map(str::to_string).collect(),
        }),
        "keyword" => {
            let (sensitivity, keywords) = rest.split_once(':').ok_or_else(|| invalid_filter_spec(arg, "missing ci/cs sensitivity"))?;
            let case_sensitive = match sensitivity {
                "cs" => true,
                "ci" => false,
                other => return Err(invalid_filter_spec(arg, &format!("unknown sensitivity '{other}', expected ci or cs"))),
            };
            Ok(FilterSpec::Keyword {
                name,
                keywords: keywords.split('|').map(str::to_string).collect(),
                case_sensitive,
            })
        }
        "length" => {
            let max_bytes = rest.parse::<usize>().map_err(|_| invalid_filter_spec(arg, "max_bytes must be a positive integer"))?;
            Ok(FilterSpec::Length { name, max_bytes })
        }
        "ratelimit" => {
            let (tokens, burst) = rest.split_once(':').ok_or_else(|| invalid_filter_spec(arg, "missing burst size"))?;
            let tokens_per_sec = tokens.parse::<f64>().map_err(|_| invalid_filter_spec(arg, "tokens_per_sec must be a number"))?;
            let burst = burst.parse::<u64>().map_err(|_| invalid_filter_spec(arg, "burst must be a positive integer"))?;
            Ok(FilterSpec::RateLimit { name, tokens_per_sec, burst })
        }
        "entropy" => {
            let threshold = rest.parse::<f64>().map_err(|_| invalid_filter_spec(arg, "threshold must be a number"))?;
            Ok(FilterSpec::Entropy { name, threshold })
        }
        other => Err(invalid_filter_spec(arg, &format!("unknown filter kind '{other}'"))),
    }
}

fn invalid_filter_spec(arg: &str, reason: &str) -> ParseError {
    ParseError::InvalidValue {
        arg: arg.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod argument_validation {
        use super::*;

        #[test]
        fn accepts_safe_arguments() {
            assert!(SecureArgParser::validate_argument("safe-arg").is_ok());
            assert!(SecureArgParser::validate_argument("path/to/file").is_ok());
        }

        #[test]
        fn rejects_too_long_arguments() {
            let long_arg = "a".repeat(MAX_ARG_LENGTH + 1);
            assert!(matches!(SecureArgParser::validate_argument(&long_arg), Err(ParseError::ArgumentTooLong(_))));
        }

        #[test]
        fn detects_dangerous_patterns() {
            let dangerous = vec!["../etc/passwd", "~/.ssh/id_rsa", "$(whoami)", "`ls`", "file;rm -rf /", "file|pipe"];
            for arg in dangerous {
                assert!(
                    matches!(SecureArgParser::validate_argument(arg), Err(ParseError::DangerousPattern { .. })),
                    "failed to detect dangerous pattern in: {arg}"
                );
            }
        }
    }

    mod number_validation {
        use super::*;

        #[test]
        fn validates_valid_numbers() {
            let result = SecureArgParser::validate_number::<u32>("threads", "8", Some(1), Some(16));
            assert_eq!(result.unwrap(), 8);
        }

        #[test]
        fn enforces_range_constraints() {
            let result = SecureArgParser::validate_number::<u32>("threads", "100", Some(1), Some(16));
            assert!(matches!(result, Err(ParseError::InvalidValue { .. })));
        }
    }

    mod filter_spec_parsing {
        use super::*;

        #[test]
        fn parses_regex_filter() {
            let spec = parse_filter_spec("regex:sqli:select.*from|union.*select").unwrap();
            assert!(matches!(spec, FilterSpec::Regex { ref name, ref patterns } if name == "sqli" && patterns.len() == 2));
        }

        #[test]
        fn parses_keyword_filter_with_sensitivity() {
            let spec = parse_filter_spec("keyword:secrets:ci:password|token").unwrap();
            match spec {
                FilterSpec::Keyword { name, keywords, case_sensitive } => {
                    assert_eq!(name, "secrets");
                    assert_eq!(keywords, vec!["password", "token"]);
                    assert!(!case_sensitive);
                }
                _ => panic!("expected Keyword"),
            }
        }

        #[test]
        fn parses_length_ratelimit_and_entropy() {
            assert!(matches!(parse_filter_spec("length:cap:4096").unwrap(), FilterSpec::Length { max_bytes: 4096, .. }));
            assert!(matches!(
                parse_filter_spec("ratelimit:rl:10.0:20").unwrap(),
                FilterSpec::RateLimit { tokens_per_sec, burst: 20, .. } if tokens_per_sec == 10.0
            ));
            assert!(matches!(parse_filter_spec("entropy:ent:7.5").unwrap(), FilterSpec::Entropy { threshold, .. } if threshold == 7.5));
        }

        #[test]
        fn rejects_unknown_kind() {
            assert!(parse_filter_spec("carrier-pigeon:x:y").is_err());
        }

        #[test]
        fn rejects_missing_parameters() {
            assert!(parse_filter_spec("regex:onlyname").is_err());
        }
    }

    mod stream_id_parsing {
        use super::*;

        #[test]
        fn rejects_non_uuid_input() {
            assert!(parse_stream_id("not-a-uuid").is_err());
        }

        #[test]
        fn accepts_a_real_uuid() {
            let id = StreamId::new();
            let parsed = parse_stream_id(&id.to_string()).unwrap();
            assert_eq!(parsed.to_string(), id.to_string());
        }
    }
}
