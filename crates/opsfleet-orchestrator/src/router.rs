use crate::fleet::WorkerFleet;
use crate::registry::CapabilityRegistry;
use opsfleet_core::Worker;
use std::sync::Arc;

/// Historically stable task-type → preferred-worker affinities. Static
/// routing outranks generic capability matching; capability matching
/// remains the fallback for dynamically spawned workers.
fn static_route(task_type: &str) -> Option<&'static str> {
    match task_type {
        "email_processing" | "calendar_management" => Some("inbox_calendar"),
        "data_analysis" => Some("spreadsheet_processor"),
        "report_generation" => Some("automated_reporting"),
        "crm_sync" => Some("crm_sync"),
        "screen_analysis" => Some("screen_activity"),
        "personal_assist" | "local_coding_assist" => Some("desk_assistant"),
        _ => None,
    }
}

/// Three-tier worker resolution policy.
pub struct TaskRouter;

impl TaskRouter {
    /// Resolve a task to exactly one worker; `None` means unroutable (an
    /// expected runtime condition, not a panic). Tried in order, first
    /// match wins:
    ///
    /// 1. `explicit_agent` as a direct fleet key — operator intent.
    /// 2. `explicit_agent` matching a worker's own declared id (aliasing).
    /// 3. The static task-type map, when that worker exists in the fleet.
    /// 4. The first capability-index candidate for the task type.
    pub fn resolve(
        task_type: &str,
        explicit_agent: Option<&str>,
        fleet: &WorkerFleet,
        registry: &CapabilityRegistry,
    ) -> Option<(String, Arc<dyn Worker>)> {
        if let Some(key) = explicit_agent {
            if let Some(worker) = fleet.get(key) {
                return Some((key.to_string(), worker));
            }
            for (id, worker) in fleet.iter() {
                if worker.id() == key {
                    return Some((id.to_string(), Arc::clone(worker)));
                }
            }
        }

        if let Some(preferred) = static_route(task_type) {
            if let Some(worker) = fleet.get(preferred) {
                return Some((preferred.to_string(), worker));
            }
        }

        registry
            .lookup(task_type)
            .iter()
            .find_map(|id| fleet.get(id).map(|worker| (id.clone(), worker)))
    }
}
