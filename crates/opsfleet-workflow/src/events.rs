use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// One phase-transition event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
    /// Phase name, or `workflow` for run-level transitions.
    pub phase: String,
    /// New status.
    pub status: String,
    /// Structured detail for dashboards.
    pub payload: Value,
}

/// Latest known state of one workflow, for cross-workflow listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Run id.
    pub workflow_id: Uuid,
    /// Most recently recorded phase.
    pub last_phase: String,
    /// Its status.
    pub status: String,
    /// When it was recorded.
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct EventMap {
    order: Vec<Uuid>,
    events: HashMap<Uuid, Vec<WorkflowEvent>>,
}

#[derive(Serialize)]
struct EventFile<'a> {
    updated_at: String,
    workflows: &'a HashMap<Uuid, Vec<WorkflowEvent>>,
}

/// Append-only per-workflow event log with optional JSON write-through.
///
/// Events are held in memory; when a store path is configured, the whole
/// map is rewritten after each append. Persistence is best effort: a
/// failed write is logged and in-memory state stays authoritative.
pub struct WorkflowEventStore {
    inner: RwLock<EventMap>,
    path: Option<PathBuf>,
}

impl WorkflowEventStore {
    /// In-memory store without write-through.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(EventMap::default()),
            path: None,
        }
    }

    /// Store that rewrites `path` after each recorded event.
    pub fn with_store_path(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(EventMap::default()),
            path: Some(path.into()),
        }
    }

    /// Record a transition and persist the full event map.
    pub async fn record(&self, workflow_id: Uuid, phase: &str, status: &str, payload: Value) {
        let event = WorkflowEvent {
            timestamp: Utc::now(),
            phase: phase.to_string(),
            status: status.to_string(),
            payload,
        };
        let serialized = {
            let mut inner = self.inner.write();
            if !inner.events.contains_key(&workflow_id) {
                inner.order.push(workflow_id);
            }
            inner.events.entry(workflow_id).or_default().push(event);
            self.path.as_ref().map(|_| {
                serde_json::to_string_pretty(&EventFile {
                    updated_at: Utc::now().to_rfc3339(),
                    workflows: &inner.events,
                })
            })
        };
        info!(%workflow_id, phase, status, "workflow event recorded");

        if let (Some(path), Some(serialized)) = (&self.path, serialized) {
            match serialized {
                Ok(raw) => {
                    if let Err(e) = tokio::fs::write(path, raw).await {
                        warn!(path = %path.display(), error = %e, "failed to persist workflow events");
                    }
                }
                Err(e) => warn!(error = %e, "failed to serialize workflow events"),
            }
        }
    }

    /// Full event list for one workflow, optionally limited to the most
    /// recent `limit` entries.
    pub fn events_for(&self, workflow_id: Uuid, limit: Option<usize>) -> Vec<WorkflowEvent> {
        let inner = self.inner.read();
        let events = inner.events.get(&workflow_id).cloned().unwrap_or_default();
        match limit {
            Some(limit) if events.len() > limit => events[events.len() - limit..].to_vec(),
            _ => events,
        }
    }

    /// Latest phase/status per workflow, newest workflow first.
    pub fn summaries(&self, limit: Option<usize>) -> Vec<WorkflowSummary> {
        let inner = self.inner.read();
        let mut summaries: Vec<WorkflowSummary> = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| {
                let latest = inner.events.get(id)?.last()?;
                Some(WorkflowSummary {
                    workflow_id: *id,
                    last_phase: latest.phase.clone(),
                    status: latest.status.clone(),
                    updated_at: latest.timestamp,
                })
            })
            .collect();
        if let Some(limit) = limit {
            summaries.truncate(limit);
        }
        summaries
    }
}

impl Default for WorkflowEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_events_kept_in_append_order() {
        let store = WorkflowEventStore::new();
        let id = Uuid::new_v4();
        store.record(id, "workflow", "started", json!({})).await;
        store.record(id, "assessment", "completed", json!({})).await;

        let events = store.events_for(id, None);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, "workflow");
        assert_eq!(events[1].phase, "assessment");

        let limited = store.events_for(id, Some(1));
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].phase, "assessment");
    }

    #[tokio::test]
    async fn test_summaries_newest_first() {
        let store = WorkflowEventStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.record(first, "workflow", "started", json!({})).await;
        store.record(second, "workflow", "started", json!({})).await;
        store.record(second, "testing", "blocked", json!({})).await;

        let summaries = store.summaries(None);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].workflow_id, second);
        assert_eq!(summaries[0].last_phase, "testing");
        assert_eq!(summaries[0].status, "blocked");
        assert_eq!(summaries[1].workflow_id, first);

        assert_eq!(store.summaries(Some(1)).len(), 1);
    }

    #[tokio::test]
    async fn test_write_through_persists_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let store = WorkflowEventStore::with_store_path(&path);
        let id = Uuid::new_v4();
        store.record(id, "workflow", "started", json!({"k": 1})).await;

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed["updated_at"].is_string());
        assert_eq!(parsed["workflows"][id.to_string()][0]["status"], "started");
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_empty() {
        let store = WorkflowEventStore::new();
        assert!(store.events_for(Uuid::new_v4(), None).is_empty());
        assert!(store.summaries(None).is_empty());
    }
}
