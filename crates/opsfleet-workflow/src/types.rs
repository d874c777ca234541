use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The five fixed workflow phases, executed strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    /// Read-only project inspection.
    Assessment,
    /// Playbook application.
    Remediation,
    /// External test command.
    Testing,
    /// Dependency audit and secret sweep.
    Security,
    /// Packaging artifact generation.
    Deployment,
}

impl PhaseName {
    /// Execution order.
    pub const ORDERED: [PhaseName; 5] = [
        PhaseName::Assessment,
        PhaseName::Remediation,
        PhaseName::Testing,
        PhaseName::Security,
        PhaseName::Deployment,
    ];

    /// Wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Assessment => "assessment",
            PhaseName::Remediation => "remediation",
            PhaseName::Testing => "testing",
            PhaseName::Security => "security",
            PhaseName::Deployment => "deployment",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    /// The phase ran and passed.
    Completed,
    /// The phase had nothing to do.
    Skipped,
    /// The phase's gate did not pass; later phases must not run.
    Blocked,
    /// The phase itself hit an unexpected error.
    Failed,
}

impl PhaseStatus {
    /// Whether the next phase may run. Blockage is expected, not
    /// exceptional; only `completed` and `skipped` open the gate.
    pub fn allows_progress(&self) -> bool {
        matches!(self, PhaseStatus::Completed | PhaseStatus::Skipped)
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PhaseStatus::Completed => "completed",
            PhaseStatus::Skipped => "skipped",
            PhaseStatus::Blocked => "blocked",
            PhaseStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal-or-in-progress state of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Phases are still executing.
    InProgress,
    /// Every phase completed or was skipped.
    Completed,
    /// A phase gate did not pass.
    Blocked,
    /// The engine itself hit an unexpected error.
    Failed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Blocked => "blocked",
            WorkflowStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Immutable result of one phase, appended to the workflow record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Which phase ran.
    pub name: PhaseName,
    /// How it ended.
    pub status: PhaseStatus,
    /// When the phase started.
    pub started_at: DateTime<Utc>,
    /// When the phase finished.
    pub completed_at: DateTime<Utc>,
    /// Generated file paths, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    /// Phase-specific structured detail.
    #[serde(default)]
    pub details: Value,
}

/// One workflow run. Created at `run()` invocation; terminal once the
/// status leaves `in_progress`, never resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// Unique run id.
    pub workflow_id: Uuid,
    /// Human-readable run name.
    pub name: String,
    /// Playbook applied during remediation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playbook_id: Option<String>,
    /// Caller-supplied context.
    pub metadata: Value,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// Phase results in execution order.
    pub phases: Vec<PhaseResult>,
    /// Overall run status.
    pub status: WorkflowStatus,
    /// Engine error message when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowRecord {
    /// Fresh in-progress record.
    pub fn new(name: String, playbook_id: Option<String>, metadata: Value) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            name,
            playbook_id,
            metadata,
            created_at: Utc::now(),
            phases: Vec::new(),
            status: WorkflowStatus::InProgress,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_open_only_for_completed_and_skipped() {
        assert!(PhaseStatus::Completed.allows_progress());
        assert!(PhaseStatus::Skipped.allows_progress());
        assert!(!PhaseStatus::Blocked.allows_progress());
        assert!(!PhaseStatus::Failed.allows_progress());
    }

    #[test]
    fn test_phase_order_is_fixed() {
        let names: Vec<&str> = PhaseName::ORDERED.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            names,
            vec!["assessment", "remediation", "testing", "security", "deployment"]
        );
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(WorkflowStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            serde_json::to_value(WorkflowStatus::InProgress).ok(),
            Some(serde_json::json!("in_progress"))
        );
    }
}
