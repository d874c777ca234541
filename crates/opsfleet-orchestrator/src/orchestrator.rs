use crate::fleet::WorkerFleet;
use crate::metrics::OrchestratorMetrics;
use crate::normalizer::normalize;
use crate::registry::CapabilityRegistry;
use crate::router::TaskRouter;
use chrono::Utc;
use opsfleet_core::{
    OpsfleetError, OpsfleetResult, TaskDescriptor, TaskResult, TaskStatus, WorkflowDispatch,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

/// Task type that bypasses routing and goes to the workflow engine.
const WORKFLOW_TASK_TYPE: &str = "modernization_workflow";

/// Agent name stamped on results the orchestrator produces itself.
const SELF_AGENT: &str = "orchestrator";

/// The single ingress for ad-hoc tasks.
///
/// Composes the capability registry, the router, and the result normalizer
/// into one `delegate` entry point, and drains a FIFO backlog on a timer.
/// `delegate` returns exactly one [`TaskResult`] per call; internal
/// failures become error-status results, never panics or `Err`.
pub struct TaskOrchestrator {
    fleet: Arc<RwLock<WorkerFleet>>,
    registry: RwLock<CapabilityRegistry>,
    backlog: Mutex<VecDeque<TaskDescriptor>>,
    workflow: Option<Arc<dyn WorkflowDispatch>>,
    metrics: Arc<OrchestratorMetrics>,
    running: AtomicBool,
}

impl TaskOrchestrator {
    /// Creates an orchestrator over an injected fleet registry.
    pub fn new(fleet: Arc<RwLock<WorkerFleet>>) -> Self {
        Self {
            fleet,
            registry: RwLock::new(CapabilityRegistry::new()),
            backlog: Mutex::new(VecDeque::new()),
            workflow: None,
            metrics: Arc::new(OrchestratorMetrics::default()),
            running: AtomicBool::new(false),
        }
    }

    /// Attach the modernization workflow engine.
    pub fn with_workflow_dispatch(mut self, dispatch: Arc<dyn WorkflowDispatch>) -> Self {
        self.workflow = Some(dispatch);
        self
    }

    /// Delegation counters.
    pub fn metrics(&self) -> &Arc<OrchestratorMetrics> {
        &self.metrics
    }

    /// Delegate a task to the appropriate worker.
    pub async fn delegate(&self, task: TaskDescriptor) -> TaskResult {
        let started_at = Utc::now();
        match self.delegate_inner(&task, started_at).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    task_type = %task.task_type,
                    task_id = %task.task_id,
                    error = %e,
                    "task delegation failed"
                );
                self.metrics.record_error();
                TaskResult::error(SELF_AGENT, started_at, e.to_string())
            }
        }
    }

    async fn delegate_inner(
        &self,
        task: &TaskDescriptor,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> OpsfleetResult<TaskResult> {
        info!(task_type = %task.task_type, task_id = %task.task_id, "delegating task");

        if task.task_type == WORKFLOW_TASK_TYPE {
            if let Some(dispatch) = &self.workflow {
                return self.forward_to_workflow(task, dispatch.as_ref(), started_at).await;
            }
            // no engine attached; falls through to normal routing
        }

        let resolved = {
            let fleet = self.fleet.read().await;
            // fleet composition can change between calls; rebuild every time
            let mut registry = self.registry.write().await;
            registry.rebuild(&fleet);
            TaskRouter::resolve(
                &task.task_type,
                task.explicit_agent.as_deref(),
                &fleet,
                &registry,
            )
        };

        let Some((worker_id, worker)) = resolved else {
            warn!(task_type = %task.task_type, "no agent found for task");
            self.metrics.record_unrouted();
            return Ok(TaskResult::error(
                SELF_AGENT,
                started_at,
                format!("no agent found for task type: {}", task.task_type),
            ));
        };

        if !worker.is_running() {
            worker.start().await.map_err(|e| {
                OpsfleetError::Worker(format!("failed to start worker {worker_id}: {e}"))
            })?;
        }

        let output = worker.execute(task).await?;
        let completed_at = Utc::now();
        self.metrics.record_delegated();
        info!(task_type = %task.task_type, agent = %worker_id, "task executed");
        Ok(normalize(&worker_id, output, started_at, completed_at))
    }

    async fn forward_to_workflow(
        &self,
        task: &TaskDescriptor,
        dispatch: &dyn WorkflowDispatch,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> OpsfleetResult<TaskResult> {
        let playbook_id = string_field(&task.payload, "playbook_id");
        let name = string_field(&task.payload, "workflow_name");
        let outcome = dispatch
            .run_workflow(playbook_id, name, task.payload.clone())
            .await?;

        let (status, error) = if outcome.status == "completed" {
            (TaskStatus::Success, None)
        } else {
            (
                TaskStatus::Error,
                Some(format!("workflow {}", outcome.status)),
            )
        };
        Ok(TaskResult {
            agent: "workflow_engine".to_string(),
            started_at,
            completed_at: Utc::now(),
            status,
            data: outcome.record,
            error,
            duration_ms: None,
        })
    }

    /// Push a task onto the FIFO backlog.
    pub async fn enqueue(&self, task: TaskDescriptor) {
        self.backlog.lock().await.push_back(task);
    }

    /// Tasks currently waiting in the backlog.
    pub async fn backlog_len(&self) -> usize {
        self.backlog.lock().await.len()
    }

    /// Pop at most one task from the backlog and delegate it. Cooperative:
    /// a slow worker delays the next drain, there is no internal timeout.
    pub async fn process_pending(&self) -> Option<TaskResult> {
        if !self.is_running() {
            return None;
        }
        let task = self.backlog.lock().await.pop_front()?;
        self.metrics.record_drained();
        Some(self.delegate(task).await)
    }

    /// Mark the orchestrator running so the drain loop processes tasks.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!("task orchestrator started");
    }

    /// Stop the drain loop after its current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("task orchestrator stopped");
    }

    /// Whether the drain loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the cooperative backlog drain loop. The loop exits on `stop`.
    pub fn spawn_backlog_drain(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if !orchestrator.is_running() {
                    break;
                }
                orchestrator.process_pending().await;
            }
        })
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}
