//! Task routing and delegation across a dynamic, heterogeneous worker fleet.
//!
//! The orchestrator is the single ingress for ad-hoc tasks: it rebuilds the
//! capability index from the live fleet, resolves exactly one worker through
//! a three-tier routing policy, executes the task, and folds the worker's
//! native result shape into one canonical [`TaskResult`] envelope. It never
//! panics and never returns an error to the caller; every failure mode
//! becomes an error-status result.
//!
//! # Main types
//!
//! - [`TaskOrchestrator`] — `delegate(task) -> TaskResult` plus the FIFO
//!   backlog drain loop.
//! - [`WorkerFleet`] — Injected registry of live workers.
//! - [`CapabilityRegistry`] — Capability tag → worker multimap, rebuilt per
//!   routing decision.
//! - [`TaskRouter`] — Three-tier resolution policy.
//!
//! [`TaskResult`]: opsfleet_core::TaskResult

/// Worker fleet registry.
pub mod fleet;
/// Capability tag index.
pub mod registry;
/// Worker resolution policy.
pub mod router;
/// Result normalization.
pub mod normalizer;
/// Delegation counters.
pub mod metrics;
/// The delegation engine.
pub mod orchestrator;

pub use fleet::WorkerFleet;
pub use metrics::{MetricsSnapshot, OrchestratorMetrics};
pub use normalizer::normalize;
pub use orchestrator::TaskOrchestrator;
pub use registry::CapabilityRegistry;
pub use router::TaskRouter;
