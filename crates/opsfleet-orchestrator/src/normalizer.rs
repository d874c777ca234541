use chrono::{DateTime, Utc};
use opsfleet_core::{TaskResult, TaskStatus, WorkerOutput};
use serde_json::Value;

/// Fold a worker's native return shape into the canonical [`TaskResult`]
/// envelope. Total: never fails, whatever the worker returned.
///
/// All three shapes get stamped with `agent`, `started_at` (captured before
/// dispatch), and `completed_at` (captured after). For the map shape the
/// `status`, `error`, and `duration_ms` keys are lifted into the envelope
/// and the remaining keys become `data`; a map without a `status` key
/// defaults to success.
pub fn normalize(
    agent: &str,
    output: WorkerOutput,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> TaskResult {
    match output {
        WorkerOutput::Structured {
            success,
            data,
            error_message,
            duration_ms,
        } => TaskResult {
            agent: agent.to_string(),
            started_at,
            completed_at,
            status: if success {
                TaskStatus::Success
            } else {
                TaskStatus::Error
            },
            data,
            error: error_message,
            duration_ms,
        },
        WorkerOutput::Map(mut map) => {
            let status = match map.remove("status") {
                Some(Value::String(s)) if s == "error" => TaskStatus::Error,
                _ => TaskStatus::Success,
            };
            let error = map
                .remove("error")
                .and_then(|v| v.as_str().map(str::to_string));
            let duration_ms = map.remove("duration_ms").and_then(|v| v.as_u64());
            TaskResult {
                agent: agent.to_string(),
                started_at,
                completed_at,
                status,
                data: Value::Object(map),
                error,
                duration_ms,
            }
        }
        WorkerOutput::Opaque(value) => TaskResult {
            agent: agent.to_string(),
            started_at,
            completed_at,
            status: TaskStatus::Success,
            data: value,
            error: None,
            duration_ms: None,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stamps() -> (DateTime<Utc>, DateTime<Utc>) {
        let started = Utc::now();
        (started, started + chrono::Duration::milliseconds(5))
    }

    #[test]
    fn test_structured_success() {
        let (started, completed) = stamps();
        let output = WorkerOutput::Structured {
            success: true,
            data: json!({"rows": 10}),
            error_message: None,
            duration_ms: Some(42),
        };
        let result = normalize("worker_a", output, started, completed);
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.agent, "worker_a");
        assert_eq!(result.data["rows"], 10);
        assert_eq!(result.duration_ms, Some(42));
        assert_eq!(result.started_at, started);
        assert_eq!(result.completed_at, completed);
    }

    #[test]
    fn test_structured_failure_carries_message() {
        let (started, completed) = stamps();
        let result = normalize(
            "worker_a",
            WorkerOutput::failure("upstream timeout"),
            started,
            completed,
        );
        assert_eq!(result.status, TaskStatus::Error);
        assert_eq!(result.error.as_deref(), Some("upstream timeout"));
    }

    #[test]
    fn test_map_defaults_to_success() {
        let (started, completed) = stamps();
        let mut map = serde_json::Map::new();
        map.insert("items".to_string(), json!([1, 2, 3]));
        let result = normalize("worker_b", WorkerOutput::Map(map), started, completed);
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.data["items"], json!([1, 2, 3]));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_map_status_and_duration_lifted() {
        let (started, completed) = stamps();
        let mut map = serde_json::Map::new();
        map.insert("status".to_string(), json!("error"));
        map.insert("error".to_string(), json!("bad input"));
        map.insert("duration_ms".to_string(), json!(7));
        map.insert("detail".to_string(), json!("context"));
        let result = normalize("worker_b", WorkerOutput::Map(map), started, completed);
        assert_eq!(result.status, TaskStatus::Error);
        assert_eq!(result.error.as_deref(), Some("bad input"));
        assert_eq!(result.duration_ms, Some(7));
        // lifted keys are gone from the payload, the rest survives
        assert!(result.data.get("status").is_none());
        assert_eq!(result.data["detail"], "context");
    }

    #[test]
    fn test_opaque_wrapped_as_success() {
        let (started, completed) = stamps();
        let result = normalize("worker_c", WorkerOutput::Opaque(json!(17)), started, completed);
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.data, json!(17));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_all_shapes_stamp_agent_and_times() {
        let (started, completed) = stamps();
        let shapes = vec![
            WorkerOutput::success(json!(null)),
            WorkerOutput::Map(serde_json::Map::new()),
            WorkerOutput::Opaque(json!("text")),
        ];
        for shape in shapes {
            let result = normalize("any", shape, started, completed);
            assert_eq!(result.agent, "any");
            assert_eq!(result.started_at, started);
            assert_eq!(result.completed_at, completed);
            assert!(matches!(result.status, TaskStatus::Success | TaskStatus::Error));
        }
    }
}
