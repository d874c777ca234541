use opsfleet_core::Worker;
use std::collections::HashMap;
use std::sync::Arc;

/// Injected registry of live workers.
///
/// The fleet owns only references; workers themselves live with their
/// spawner. Registration order is preserved so capability lookups stay
/// deterministic while the fleet composition changes between calls.
#[derive(Default, Clone)]
pub struct WorkerFleet {
    order: Vec<String>,
    workers: HashMap<String, Arc<dyn Worker>>,
}

impl WorkerFleet {
    /// Creates an empty fleet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker under its own id. Re-registering an id replaces
    /// the handle but keeps the original position.
    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        let key = worker.id().to_string();
        self.register_as(key, worker);
    }

    /// Register a worker under an explicit fleet key, which may differ from
    /// the worker's own declared id (aliasing).
    pub fn register_as(&mut self, key: impl Into<String>, worker: Arc<dyn Worker>) {
        let key = key.into();
        if !self.workers.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.workers.insert(key, worker);
    }

    /// Remove a worker from the fleet.
    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn Worker>> {
        let removed = self.workers.remove(id);
        if removed.is_some() {
            self.order.retain(|known| known != id);
        }
        removed
    }

    /// Look up a worker by its fleet key.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Worker>> {
        self.workers.get(id).cloned()
    }

    /// Whether the fleet key exists.
    pub fn contains(&self, id: &str) -> bool {
        self.workers.contains_key(id)
    }

    /// Iterate workers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Worker>)> {
        self.order
            .iter()
            .filter_map(|id| self.workers.get(id).map(|w| (id.as_str(), w)))
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the fleet is empty.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
