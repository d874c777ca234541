use opsfleet_core::{Finding, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-severity score penalties.
const HIGH_PENALTY: i64 = 20;
const MEDIUM_PENALTY: i64 = 10;
const LOW_PENALTY: i64 = 5;

/// Derived view over the full findings set. Never stored incrementally;
/// recomputed from scratch on every pass so external edits to the findings
/// file are reflected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Total number of findings.
    pub total_findings: usize,
    /// Finding counts keyed by finding type.
    pub by_type: BTreeMap<String, u64>,
    /// Finding counts keyed by severity.
    pub by_severity: BTreeMap<String, u64>,
    /// Finding counts keyed by producing scanner.
    pub by_agent: BTreeMap<String, u64>,
    /// Deterministic go/no-go heuristic, 0-100.
    pub readiness_score: u8,
}

/// Buckets findings and computes the readiness score.
pub struct AuditFindingsAggregator;

impl AuditFindingsAggregator {
    /// Compile the full findings set into a summary.
    ///
    /// `readiness_score = clamp(100 - 20*high - 10*medium - 5*low, 0, 100)`.
    pub fn compile(findings: &[Finding]) -> AuditSummary {
        let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
        let mut by_severity: BTreeMap<String, u64> = BTreeMap::new();
        let mut by_agent: BTreeMap<String, u64> = BTreeMap::new();
        let mut penalty: i64 = 0;

        for finding in findings {
            *by_type.entry(finding.kind.clone()).or_default() += 1;
            *by_severity
                .entry(finding.severity.to_string())
                .or_default() += 1;
            *by_agent.entry(finding.agent.clone()).or_default() += 1;
            penalty += match finding.severity {
                Severity::High => HIGH_PENALTY,
                Severity::Medium => MEDIUM_PENALTY,
                Severity::Low => LOW_PENALTY,
            };
        }

        let score = (100 - penalty).clamp(0, 100);
        AuditSummary {
            total_findings: findings.len(),
            by_type,
            by_severity,
            by_agent,
            // clamped into u8 range above
            readiness_score: score as u8,
        }
    }
}
