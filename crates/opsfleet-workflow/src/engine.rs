use crate::bundle::ArtifactBundler;
use crate::events::WorkflowEventStore;
use crate::playbook::PlaybookManager;
use crate::scan::SecurityScanner;
use crate::types::{PhaseName, PhaseResult, PhaseStatus, WorkflowRecord, WorkflowStatus};
use async_trait::async_trait;
use chrono::Utc;
use opsfleet_core::{
    OpsfleetError, OpsfleetResult, WorkflowDispatch, WorkflowOutcome, WorkflowSettings,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Runs the five-phase modernization pipeline as a gated state machine.
///
/// Phases execute strictly in order. The first phase whose status is
/// neither `completed` nor `skipped` blocks the run; an error inside the
/// engine itself marks the run `failed`. Either way `run` always returns
/// the full record, and every transition lands in the event store.
pub struct WorkflowEngine {
    project_root: PathBuf,
    settings: WorkflowSettings,
    playbooks: PlaybookManager,
    scanner: SecurityScanner,
    bundler: ArtifactBundler,
    events: Arc<WorkflowEventStore>,
    workflows: RwLock<Vec<WorkflowRecord>>,
}

impl WorkflowEngine {
    /// Engine over the project at `project_root`.
    pub fn new(
        project_root: impl Into<PathBuf>,
        settings: WorkflowSettings,
        events: Arc<WorkflowEventStore>,
    ) -> Self {
        let project_root = project_root.into();
        let playbooks = PlaybookManager::new(&project_root);
        let scanner = SecurityScanner::new(settings.audit_command.clone());
        let bundler = ArtifactBundler::new(project_root.join(&settings.output_dir));
        Self {
            project_root,
            settings,
            playbooks,
            scanner,
            bundler,
            events,
            workflows: RwLock::new(Vec::new()),
        }
    }

    /// All runs started by this engine, oldest first.
    pub fn list_workflows(&self) -> Vec<WorkflowRecord> {
        self.workflows.read().clone()
    }

    /// A single run by id.
    pub fn get_workflow(&self, workflow_id: Uuid) -> Option<WorkflowRecord> {
        self.workflows
            .read()
            .iter()
            .find(|w| w.workflow_id == workflow_id)
            .cloned()
    }

    /// Shared event store.
    pub fn events(&self) -> &Arc<WorkflowEventStore> {
        &self.events
    }

    /// Execute one workflow run to a terminal state.
    pub async fn run(
        &self,
        playbook_id: Option<String>,
        name: Option<String>,
        metadata: Value,
    ) -> WorkflowRecord {
        let mut record = WorkflowRecord::new(String::new(), playbook_id, metadata);
        let short_id = record.workflow_id.simple().to_string()[..8].to_string();
        record.name = name.unwrap_or_else(|| format!("modernization-{short_id}"));
        let workflow_id = record.workflow_id;

        self.workflows.write().push(record.clone());
        self.events
            .record(
                workflow_id,
                "workflow",
                "started",
                serde_json::to_value(&record).unwrap_or(Value::Null),
            )
            .await;
        info!(%workflow_id, name = %record.name, "workflow started");

        for phase in PhaseName::ORDERED {
            match self.run_phase(phase, &record, &short_id).await {
                Ok(result) => {
                    let status = result.status;
                    self.events
                        .record(
                            workflow_id,
                            phase.as_str(),
                            &status.to_string(),
                            result.details.clone(),
                        )
                        .await;
                    record.phases.push(result);
                    if !status.allows_progress() {
                        record.status = WorkflowStatus::Blocked;
                        info!(%workflow_id, phase = %phase, "workflow blocked");
                        break;
                    }
                }
                Err(e) => {
                    error!(%workflow_id, phase = %phase, error = %e, "workflow execution failed");
                    record.status = WorkflowStatus::Failed;
                    record.error = Some(e.to_string());
                    self.events
                        .record(
                            workflow_id,
                            "workflow",
                            "failed",
                            json!({"error": e.to_string()}),
                        )
                        .await;
                    break;
                }
            }
        }

        if record.status == WorkflowStatus::InProgress {
            record.status = WorkflowStatus::Completed;
        }

        {
            let mut workflows = self.workflows.write();
            if let Some(stored) = workflows
                .iter_mut()
                .find(|w| w.workflow_id == workflow_id)
            {
                *stored = record.clone();
            }
        }
        self.events
            .record(
                workflow_id,
                "workflow",
                &record.status.to_string(),
                serde_json::to_value(&record).unwrap_or(Value::Null),
            )
            .await;
        info!(%workflow_id, status = %record.status, "workflow finished");
        record
    }

    async fn run_phase(
        &self,
        phase: PhaseName,
        record: &WorkflowRecord,
        short_id: &str,
    ) -> OpsfleetResult<PhaseResult> {
        let started_at = Utc::now();
        let playbook_id = record.playbook_id.as_deref();

        let (status, artifacts, details) = match phase {
            PhaseName::Assessment => {
                let mut assessment = self.playbooks.assess_project(&self.project_root)?;
                if let Some(id) = playbook_id {
                    assessment["playbook_preview"] =
                        self.playbooks.apply_playbook(id, &self.project_root)?;
                }
                (PhaseStatus::Completed, Vec::new(), assessment)
            }
            PhaseName::Remediation => match playbook_id {
                None => (
                    PhaseStatus::Skipped,
                    Vec::new(),
                    json!({"applied_playbook": Value::Null, "actions": []}),
                ),
                Some(id) => match self.playbooks.apply_playbook(id, &self.project_root) {
                    Ok(outcome) => (
                        PhaseStatus::Completed,
                        Vec::new(),
                        json!({"applied_playbook": id, "actions": outcome["results"]}),
                    ),
                    Err(e) => (
                        PhaseStatus::Blocked,
                        Vec::new(),
                        json!({"applied_playbook": id, "error": e.to_string()}),
                    ),
                },
            },
            PhaseName::Testing => {
                let (program, args) = self
                    .settings
                    .test_command
                    .split_first()
                    .ok_or_else(|| {
                        OpsfleetError::Workflow("no test command configured".to_string())
                    })?;
                let output = tokio::process::Command::new(program)
                    .args(args)
                    .current_dir(&self.project_root)
                    .output()
                    .await
                    .map_err(|e| {
                        OpsfleetError::Workflow(format!("test command {program} failed: {e}"))
                    })?;
                let status = if output.status.success() {
                    PhaseStatus::Completed
                } else {
                    PhaseStatus::Blocked
                };
                (
                    status,
                    Vec::new(),
                    json!({
                        "return_code": output.status.code(),
                        "stdout": String::from_utf8_lossy(&output.stdout).trim(),
                        "stderr": String::from_utf8_lossy(&output.stderr).trim(),
                    }),
                )
            }
            PhaseName::Security => {
                let report = self.scanner.run_scans(&self.project_root).await;
                let status = if report.is_clean() {
                    PhaseStatus::Completed
                } else {
                    PhaseStatus::Blocked
                };
                (status, Vec::new(), serde_json::to_value(&report)?)
            }
            PhaseName::Deployment => {
                let artifacts = self
                    .bundler
                    .generate_bundle(
                        &format!("{short_id}-bundle"),
                        &self.project_root,
                        json!({"playbook_id": playbook_id}),
                    )
                    .await?;
                (
                    PhaseStatus::Completed,
                    artifacts,
                    json!({"bundle": format!("{short_id}-bundle")}),
                )
            }
        };

        Ok(PhaseResult {
            name: phase,
            status,
            started_at,
            completed_at: Utc::now(),
            artifacts,
            details,
        })
    }
}

#[async_trait]
impl WorkflowDispatch for WorkflowEngine {
    async fn run_workflow(
        &self,
        playbook_id: Option<String>,
        name: Option<String>,
        metadata: Value,
    ) -> OpsfleetResult<WorkflowOutcome> {
        let record = self.run(playbook_id, name, metadata).await;
        Ok(WorkflowOutcome {
            workflow_id: record.workflow_id.to_string(),
            status: record.status.to_string(),
            record: serde_json::to_value(&record)?,
        })
    }
}
