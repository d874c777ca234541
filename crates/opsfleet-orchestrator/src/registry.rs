use crate::fleet::WorkerFleet;
use std::collections::HashMap;
use tracing::warn;

/// Multimap from capability tag to worker ids.
///
/// Rebuilt from scratch before every routing decision rather than
/// incrementally maintained, trading some CPU for correctness under a
/// dynamically changing fleet.
#[derive(Debug, Default, Clone)]
pub struct CapabilityRegistry {
    index: HashMap<String, Vec<String>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from the live fleet. A capability read failure for
    /// one worker downgrades that worker to "no capabilities"; the rebuild
    /// itself never fails.
    pub fn rebuild(&mut self, fleet: &WorkerFleet) {
        let mut index: HashMap<String, Vec<String>> = HashMap::new();
        for (id, worker) in fleet.iter() {
            let capabilities = match worker.capabilities() {
                Ok(capabilities) => capabilities,
                Err(e) => {
                    warn!(worker = id, error = %e, "failed to read worker capabilities");
                    Vec::new()
                }
            };
            for capability in capabilities {
                index.entry(capability).or_default().push(id.to_string());
            }
        }
        self.index = index;
    }

    /// Workers claiming a capability, in registration order. Empty slice
    /// for an unknown capability.
    pub fn lookup(&self, capability: &str) -> &[String] {
        self.index.get(capability).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct capability tags in the index.
    pub fn capability_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opsfleet_core::{OpsfleetError, OpsfleetResult, TaskDescriptor, Worker, WorkerOutput};
    use std::sync::Arc;

    struct CapWorker {
        id: String,
        capabilities: Option<Vec<String>>,
    }

    #[async_trait]
    impl Worker for CapWorker {
        fn id(&self) -> &str {
            &self.id
        }

        fn is_running(&self) -> bool {
            true
        }

        fn capabilities(&self) -> OpsfleetResult<Vec<String>> {
            self.capabilities
                .clone()
                .ok_or_else(|| OpsfleetError::Worker("capability probe failed".to_string()))
        }

        async fn execute(&self, _task: &TaskDescriptor) -> OpsfleetResult<WorkerOutput> {
            Ok(WorkerOutput::success(serde_json::Value::Null))
        }
    }

    fn worker(id: &str, caps: &[&str]) -> Arc<dyn Worker> {
        Arc::new(CapWorker {
            id: id.to_string(),
            capabilities: Some(caps.iter().map(|c| c.to_string()).collect()),
        })
    }

    #[test]
    fn test_rebuild_and_lookup() {
        let mut fleet = WorkerFleet::new();
        fleet.register(worker("a", &["email_processing", "crm_sync"]));
        fleet.register(worker("b", &["email_processing"]));

        let mut registry = CapabilityRegistry::new();
        registry.rebuild(&fleet);

        assert_eq!(registry.lookup("email_processing"), ["a", "b"]);
        assert_eq!(registry.lookup("crm_sync"), ["a"]);
        assert!(registry.lookup("unknown").is_empty());
        assert_eq!(registry.capability_count(), 2);
    }

    #[test]
    fn test_capability_read_failure_is_isolated() {
        let mut fleet = WorkerFleet::new();
        fleet.register(Arc::new(CapWorker {
            id: "broken".to_string(),
            capabilities: None,
        }));
        fleet.register(worker("ok", &["data_analysis"]));

        let mut registry = CapabilityRegistry::new();
        registry.rebuild(&fleet);

        // the broken worker contributes nothing; the rebuild still indexes the rest
        assert_eq!(registry.lookup("data_analysis"), ["ok"]);
        assert_eq!(registry.capability_count(), 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_index() {
        let mut fleet = WorkerFleet::new();
        fleet.register(worker("a", &["report_generation"]));

        let mut registry = CapabilityRegistry::new();
        registry.rebuild(&fleet);
        assert_eq!(registry.lookup("report_generation"), ["a"]);

        fleet.remove("a");
        registry.rebuild(&fleet);
        assert!(registry.lookup("report_generation").is_empty());
    }
}
