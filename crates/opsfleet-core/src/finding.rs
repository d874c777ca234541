use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity buckets used by the readiness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or stylistic issue.
    Low,
    /// Issue worth fixing before shipping.
    Medium,
    /// Issue that must be fixed.
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// One issue reported by a scanner. Append-only; never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Finding category (`bug`, `doc`, `security`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Severity bucket.
    pub severity: Severity,
    /// File the issue was found in, relative to the audited repository.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// Short machine-friendly issue tag.
    pub issue: String,
    /// Human-readable description.
    pub description: String,
    /// Name of the scanner that produced this finding.
    pub agent: String,
    /// When the finding was produced.
    pub timestamp: DateTime<Utc>,
}

impl Finding {
    /// Creates a finding stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        file: impl Into<String>,
        line: u32,
        issue: impl Into<String>,
        description: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            file: file.into(),
            line,
            issue: issue.into(),
            description: description.into(),
            agent: agent.into(),
            timestamp: Utc::now(),
        }
    }
}
