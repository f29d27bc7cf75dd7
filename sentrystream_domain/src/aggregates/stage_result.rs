// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `StageResult` (per-stage verdict) and `ProcessingResult` (pipeline
//! aggregate), plus the `ConsensusResult` the deep stage's reducer produces
//! (§3, §4.6).

use std::time::Duration;

use crate::aggregates::attack_pattern::Finding;
use crate::value_objects::confidence::Confidence;
use crate::value_objects::enums::{Action, StageTag};
use crate::value_objects::severity::Severity;

#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: StageTag,
    pub passed: bool,
    pub confidence: Confidence,
    pub findings: Vec<Finding>,
    pub elapsed: Duration,
}

impl StageResult {
    pub fn pass(stage: StageTag, confidence: Confidence, findings: Vec<Finding>, elapsed: Duration) -> Self {
        Self { stage, passed: true, confidence, findings, elapsed }
    }

    pub fn reject(stage: StageTag, confidence: Confidence, findings: Vec<Finding>, elapsed: Duration) -> Self {
        Self { stage, passed: false, confidence, findings, elapsed }
    }
}

/// One deep analyzer's scored opinion, before reduction.
#[derive(Debug, Clone)]
pub struct AnalyzerResult {
    pub analyzer: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub findings: Vec<Finding>,
    pub weight: f64,
}

/// The reduction of every deep analyzer's opinion into one verdict (§4.6).
#[derive(Debug, Clone)]
pub struct ConsensusResult {
    pub severity: Severity,
    pub confidence: Confidence,
    pub agreement_ratio: f64,
    pub contributing: usize,
}

impl ConsensusResult {
    /// Weighted average of severity rank × confidence, with agreement
    /// ratio = count agreeing on the modal severity ÷ returning analyzers.
    /// Analyzers that errored are assumed already excluded from `results`.
    pub fn reduce(results: &[AnalyzerResult]) -> Self {
        if results.is_empty() {
            return Self { severity: Severity::None, confidence: Confidence::ZERO, agreement_ratio: 0.0, contributing: 0 };
        }

        let total_weight: f64 = results.iter().map(|r| r.weight).sum();
        let weighted_rank: f64 = results.iter().map(|r| severity_rank(r.severity) * r.weight).sum();
        let avg_rank = if total_weight > 0.0 { weighted_rank / total_weight } else { 0.0 };
        let severity = rank_to_severity(avg_rank.round() as i64);

        let modal = mode_severity(results);
        let agreeing = results.iter().filter(|r| r.severity == modal).count();
        let agreement_ratio = agreeing as f64 / results.len() as f64;

        let weighted_confidence: f64 =
            results.iter().map(|r| r.confidence.value() * r.weight).sum::<f64>() / total_weight.max(f64::EPSILON);

        Self {
            severity,
            confidence: Confidence::new(weighted_confidence),
            agreement_ratio,
            contributing: results.len(),
        }
    }

    /// Terminal action per the §4.6 policy table.
    pub fn action(&self, enforcing: bool) -> Action {
        match self.severity {
            Severity::None | Severity::Info | Severity::Low => Action::Allow,
            Severity::Medium => {
                if self.agreement_ratio >= 2.0 / 3.0 {
                    if enforcing { Action::Block } else { Action::Alert }
                } else {
                    Action::Alert
                }
            }
            Severity::High => Action::Block,
            Severity::Critical => Action::Redirect,
        }
    }
}

fn severity_rank(s: Severity) -> f64 {
    match s {
        Severity::None => 0.0,
        Severity::Info => 1.0,
        Severity::Low => 2.0,
        Severity::Medium => 3.0,
        Severity::High => 4.0,
        Severity::Critical => 5.0,
    }
}

fn rank_to_severity(rank: i64) -> Severity {
    match rank {
        i64::MIN..=0 => Severity::None,
        1 => Severity::Info,
        2 => Severity::Low,
        3 => Severity::Medium,
        4 => Severity::High,
        _ => Severity::Critical,
    }
}

fn mode_severity(results: &[AnalyzerResult]) -> Severity {
    let mut counts: std::collections::HashMap<Severity, usize> = std::collections::HashMap::new();
    for r in results {
        *counts.entry(r.severity).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(s, _)| s)
        .unwrap_or(Severity::None)
}

/// Final Action plus the executor hint it came from (§3).
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub action: Action,
    pub consensus: Option<ConsensusResult>,
    pub stages: Vec<StageResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(name: &str, severity: Severity, confidence: f64, weight: f64) -> AnalyzerResult {
        AnalyzerResult { analyzer: name.to_string(), severity, confidence: Confidence::new(confidence), findings: vec![], weight }
    }

    #[test]
    fn unanimous_high_severity_blocks() {
        let results = vec![analyzer("a", Severity::High, 0.9, 1.0), analyzer("b", Severity::High, 0.8, 1.0)];
        let consensus = ConsensusResult::reduce(&results);
        assert_eq!(consensus.severity, Severity::High);
        assert_eq!(consensus.action(true), Action::Block);
    }

    #[test]
    fn critical_always_redirects() {
        let results = vec![analyzer("a", Severity::Critical, 0.95, 1.0)];
        let consensus = ConsensusResult::reduce(&results);
        assert_eq!(consensus.action(true), Action::Redirect);
    }

    #[test]
    fn medium_below_two_thirds_agreement_alerts_not_blocks() {
        let results = vec![
            analyzer("a", Severity::Medium, 0.6, 1.0),
            analyzer("b", Severity::Low, 0.3, 1.0),
            analyzer("c", Severity::None, 0.1, 1.0),
        ];
        let consensus = ConsensusResult::reduce(&results);
        // modal severity across {medium, low, none} with no repeats -> ratio 1/3
        assert!(consensus.agreement_ratio < 2.0 / 3.0);
    }

    #[test]
    fn empty_results_allow() {
        let consensus = ConsensusResult::reduce(&[]);
        assert_eq!(consensus.action(true), Action::Allow);
    }
}
