use crate::error::OpsfleetResult;
use crate::task::{TaskDescriptor, WorkerOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contract every task executor satisfies explicitly.
///
/// The concrete workers (report generation, CRM sync, spreadsheet
/// processing, screen capture, ...) live outside this workspace; the
/// orchestrator only ever sees this trait and never owns the workers,
/// only references held by the fleet registry.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Unique id within the fleet.
    fn id(&self) -> &str;

    /// Whether the worker is currently able to accept tasks.
    fn is_running(&self) -> bool;

    /// Bring the worker up. Invoked by the orchestrator before dispatch
    /// when the worker reports not running.
    async fn start(&self) -> OpsfleetResult<()> {
        Ok(())
    }

    /// Capability tags this worker claims to handle. A failure here is
    /// treated by the capability registry as "no capabilities", never as
    /// fatal for the rebuild.
    fn capabilities(&self) -> OpsfleetResult<Vec<String>>;

    /// Execute one task and return the worker's native result shape.
    async fn execute(&self, task: &TaskDescriptor) -> OpsfleetResult<WorkerOutput>;
}

/// Terse view of a finished workflow handed back to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    /// Id of the workflow that ran.
    pub workflow_id: String,
    /// Terminal workflow status (`completed`, `blocked`, or `failed`).
    pub status: String,
    /// The full workflow record as JSON.
    pub record: Value,
}

/// Seam for forwarding `modernization_workflow` tasks to the workflow
/// engine without a hard crate dependency. The engine implements this; the
/// orchestrator holds it as `Arc<dyn WorkflowDispatch>`.
#[async_trait]
pub trait WorkflowDispatch: Send + Sync {
    /// Run a workflow to one of its terminal states.
    async fn run_workflow(
        &self,
        playbook_id: Option<String>,
        name: Option<String>,
        metadata: Value,
    ) -> OpsfleetResult<WorkflowOutcome>;
}
