// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pattern Registry
//!
//! Mapping from family tag to an ordered list of `AttackPattern` (§4.2).
//! Construction compiles every literal pattern string once; a malformed
//! literal is a build-time logic error — it aborts process startup rather
//! than surfacing on the hot path. After construction the registry is
//! read-only and `match_all` never acquires a lock, satisfying the
//! concurrent-readers requirement in §5.

use std::collections::HashMap;

use regex::bytes::Regex;
use serde_json::json;

use crate::aggregates::attack_pattern::{AttackPattern, Finding};
use crate::error::{DomainError, DomainResult};
use crate::value_objects::confidence::Confidence;
use crate::value_objects::severity::Severity;

/// `(id, family, severity, confidence, pattern, description)`
type PatternDef = (&'static str, &'static str, Severity, f64, &'static str, &'static str);

const DEFAULT_PATTERNS: &[PatternDef] = &[
    (
        "sqli-union-select",
        "sql_injection",
        Severity::High,
        0.9,
        r"(?i)\bUNION\s+SELECT\b",
        "SQL UNION SELECT injection attempt",
    ),
    (
        "sqli-drop-table",
        "sql_injection",
        Severity::Critical,
        0.95,
        r"(?i)\bDROP\s+TABLE\b",
        "SQL DROP TABLE statement",
    ),
    (
        "sqli-delete-from",
        "sql_injection",
        Severity::Critical,
        0.9,
        r"(?i)\bDELETE\s+FROM\b",
        "SQL DELETE FROM statement",
    ),
    (
        "sqli-or-1-equals-1",
        "sql_injection",
        Severity::High,
        0.8,
        r"(?i)\bOR\s+1\s*=\s*1\b",
        "classic SQL tautology injection",
    ),
    (
        "cmdi-rm-rf-root",
        "command_injection",
        Severity::Critical,
        0.95,
        r";\s*rm\s+-rf\s+/",
        "destructive shell command chained via ';'",
    ),
    (
        "cmdi-backtick-subshell",
        "command_injection",
        Severity::High,
        0.75,
        r"`[^`]+`",
        "backtick command substitution",
    ),
    (
        "cmdi-pipe-to-shell",
        "command_injection",
        Severity::High,
        0.7,
        r"\|\s*(?:/bin/)?(?:ba)?sh\b",
        "piping input directly to a shell",
    ),
    (
        "path-etc-passwd",
        "path_traversal",
        Severity::High,
        0.9,
        r"/etc/passwd",
        "reference to /etc/passwd",
    ),
    (
        "path-etc-shadow",
        "path_traversal",
        Severity::Critical,
        0.95,
        r"/etc/shadow",
        "reference to /etc/shadow",
    ),
    (
        "path-dot-dot-slash",
        "path_traversal",
        Severity::High,
        0.8,
        r"(?:\.\./){2,}",
        "repeated '../' directory traversal",
    ),
    (
        "xss-script-tag",
        "xss",
        Severity::High,
        0.85,
        r"(?i)<script\b",
        "inline <script> tag",
    ),
    (
        "xss-javascript-uri",
        "xss",
        Severity::Medium,
        0.7,
        r"(?i)javascript:",
        "javascript: URI scheme",
    ),
    (
        "xss-onerror-handler",
        "xss",
        Severity::Medium,
        0.7,
        r"(?i)onerror\s*=",
        "inline onerror= event handler",
    ),
    (
        "prompt-ignore-previous",
        "prompt_injection",
        Severity::Medium,
        0.6,
        r"(?i)ignore\s+(?:all\s+)?previous\s+instructions",
        "LLM prompt-injection override attempt",
    ),
    (
        "prompt-system-override",
        "prompt_injection",
        Severity::Medium,
        0.55,
        r"(?i)you\s+are\s+now\s+in\s+developer\s+mode",
        "LLM jailbreak / role-override attempt",
    ),
];

pub struct PatternRegistry {
    by_family: HashMap<&'static str, Vec<AttackPattern>>,
    family_order: Vec<&'static str>,
}

impl PatternRegistry {
    /// Compiles the bundled catalogue. Returns `Err` only if a literal
    /// fails to compile, which should never happen for the constants above
    /// — callers at process startup are expected to `.expect()` this.
    pub fn with_default_patterns() -> DomainResult<Self> {
        let mut by_family: HashMap<&'static str, Vec<AttackPattern>> = HashMap::new();
        let mut family_order = Vec::new();

        for &(id, family, severity, confidence, pattern, description) in DEFAULT_PATTERNS {
            let regex = Regex::new(pattern).map_err(DomainError::from)?;
            if !by_family.contains_key(family) {
                family_order.push(family);
            }
            by_family.entry(family).or_default().push(AttackPattern {
                id,
                family,
                severity,
                confidence: Confidence::new(confidence),
                description,
                regex,
            });
        }

        Ok(Self { by_family, family_order })
    }

    /// Families known to the registry, in insertion order.
    pub fn families(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.family_order.iter().copied()
    }

    pub fn patterns_in(&self, family: &str) -> &[AttackPattern] {
        self.by_family.get(family).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Pure: repeated calls on the same input yield identical findings,
    /// ordered by family-insertion-order then pattern order within a
    /// family (§8).
    pub fn match_all(&self, bytes: &[u8]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for family in &self.family_order {
            for pattern in &self.by_family[family] {
                if pattern.regex.is_match(bytes) {
                    findings.push(Finding {
                        pattern_id: pattern.id.to_string(),
                        family: pattern.family.to_string(),
                        severity: pattern.severity,
                        confidence: pattern.confidence,
                        details: [
                            ("pattern_id".to_string(), json!(pattern.id)),
                            ("description".to_string(), json!(pattern.description)),
                        ]
                        .into_iter()
                        .collect(),
                    });
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PatternRegistry {
        PatternRegistry::with_default_patterns().expect("bundled patterns must compile")
    }

    #[test]
    fn detects_sql_union_select() {
        let r = registry();
        let findings = r.match_all(b"username=' UNION SELECT password FROM users --");
        assert!(findings.iter().any(|f| f.family == "sql_injection" && f.pattern_id == "sqli-union-select"));
    }

    #[test]
    fn detects_path_traversal_to_etc_passwd() {
        let r = registry();
        let findings = r.match_all(b"GET /../../../etc/passwd HTTP/1.1\r\n\r\n");
        assert!(findings.iter().any(|f| f.family == "path_traversal"));
        assert!(findings.iter().any(|f| f.pattern_id == "path-etc-passwd"));
    }

    #[test]
    fn match_all_is_pure_and_stably_ordered() {
        let r = registry();
        let input = b"<script>alert(1)</script> javascript:void(0) onerror=alert(2)";
        let first = r.match_all(input);
        let second = r.match_all(input);
        let first_ids: Vec<_> = first.iter().map(|f| f.pattern_id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|f| f.pattern_id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn empty_input_matches_nothing() {
        let r = registry();
        assert!(r.match_all(b"").is_empty());
    }
}
