use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Immutable description of one unit of work submitted to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// The kind of work requested (routing key).
    pub task_type: String,
    /// Caller-supplied or generated identifier for tracing the task.
    pub task_id: String,
    /// Operator-supplied routing override. Outranks type inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_agent: Option<String>,
    /// Arbitrary payload forwarded to the worker untouched.
    #[serde(default)]
    pub payload: Value,
}

impl TaskDescriptor {
    /// Creates a descriptor with a generated task id and empty payload.
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            task_id: Uuid::new_v4().to_string(),
            explicit_agent: None,
            payload: Value::Null,
        }
    }

    /// Sets a caller-supplied task id.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    /// Routes this task to a specific worker, bypassing type inference.
    pub fn with_explicit_agent(mut self, agent: impl Into<String>) -> Self {
        self.explicit_agent = Some(agent.into());
        self
    }

    /// Attaches an arbitrary payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Terminal status of a delegated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The worker finished and reported success.
    Success,
    /// The task could not be routed, started, or executed cleanly.
    Error,
}

/// Canonical result envelope. Every call through the orchestrator returns
/// exactly one of these, even when something fails internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Id of the worker that handled the task (or `"orchestrator"` /
    /// `"workflow_engine"` for results produced without a worker).
    pub agent: String,
    /// Captured before dispatch.
    pub started_at: DateTime<Utc>,
    /// Captured after the worker returned.
    pub completed_at: DateTime<Utc>,
    /// Terminal status.
    pub status: TaskStatus,
    /// Worker payload, shape untouched.
    #[serde(default)]
    pub data: Value,
    /// Failure detail when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Worker-reported execution time, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl TaskResult {
    /// Builds an error result stamped with the given start time and now.
    pub fn error(agent: impl Into<String>, started_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            started_at,
            completed_at: Utc::now(),
            status: TaskStatus::Error,
            data: Value::Null,
            error: Some(message.into()),
            duration_ms: None,
        }
    }

    /// Whether the task ended in success.
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Raw return value of a worker, before normalization.
///
/// Workers keep their native conventions; the orchestrator folds all three
/// shapes into one [`TaskResult`] envelope.
#[derive(Debug, Clone)]
pub enum WorkerOutput {
    /// Structured success/failure value.
    Structured {
        /// Whether the worker considers the task done.
        success: bool,
        /// Result payload.
        data: Value,
        /// Failure detail, when the worker reports one.
        error_message: Option<String>,
        /// Worker-measured execution time.
        duration_ms: Option<u64>,
    },
    /// Free-form key/value map; the worker is trusted to shape it.
    Map(serde_json::Map<String, Value>),
    /// Anything else: a scalar or object with no recognized shape.
    Opaque(Value),
}

impl WorkerOutput {
    /// Shorthand for a successful structured output.
    pub fn success(data: Value) -> Self {
        Self::Structured {
            success: true,
            data,
            error_message: None,
            duration_ms: None,
        }
    }

    /// Shorthand for a failed structured output.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Structured {
            success: false,
            data: Value::Null,
            error_message: Some(message.into()),
            duration_ms: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let task = TaskDescriptor::new("email_processing")
            .with_task_id("t-1")
            .with_explicit_agent("inbox_calendar")
            .with_payload(serde_json::json!({"subject": "hello"}));
        assert_eq!(task.task_type, "email_processing");
        assert_eq!(task.task_id, "t-1");
        assert_eq!(task.explicit_agent.as_deref(), Some("inbox_calendar"));
        assert_eq!(task.payload["subject"], "hello");
    }

    #[test]
    fn test_descriptor_generates_task_id() {
        let task = TaskDescriptor::new("crm_sync");
        assert!(!task.task_id.is_empty());
    }

    #[test]
    fn test_error_result() {
        let started = Utc::now();
        let result = TaskResult::error("orchestrator", started, "no agent found");
        assert_eq!(result.status, TaskStatus::Error);
        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("no agent found"));
        assert!(result.completed_at >= result.started_at);
    }

    #[test]
    fn test_task_status_serialization() {
        let json = serde_json::to_string(&TaskStatus::Success).unwrap();
        assert_eq!(json, "\"success\"");
        let parsed: TaskStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, TaskStatus::Error);
    }

    #[test]
    fn test_result_roundtrip() {
        let started = Utc::now();
        let result = TaskResult {
            agent: "worker_a".to_string(),
            started_at: started,
            completed_at: Utc::now(),
            status: TaskStatus::Success,
            data: serde_json::json!({"rows": 3}),
            error: None,
            duration_ms: Some(12),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("\"error\""));
        let parsed: TaskResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.agent, "worker_a");
        assert_eq!(parsed.duration_ms, Some(12));
    }
}
