//! The modernization workflow engine: a gated five-phase pipeline.
//!
//! A run walks `assessment → remediation → testing → security → deployment`
//! in fixed order, stopping at the first phase whose result is neither
//! `completed` nor `skipped`. Blocked runs are the designed outcome of a
//! failing gate (tests, security scan); `failed` is reserved for the engine
//! itself hitting an unexpected error. Every transition is pushed to the
//! [`WorkflowEventStore`] for dashboards.
//!
//! # Main types
//!
//! - [`WorkflowEngine`] — `run()` and the phase handlers.
//! - [`WorkflowRecord`] / [`PhaseResult`] — the run ledger.
//! - [`WorkflowEventStore`] — append-only per-run event log.
//! - [`PlaybookManager`] — predefined and custom remediation playbooks.
//! - [`SecurityScanner`] — dependency audit plus secret sweep.
//! - [`ArtifactBundler`] — deployment packaging assets.

/// Deployment artifact generation.
pub mod bundle;
/// The phase state machine.
pub mod engine;
/// Workflow event log.
pub mod events;
/// Playbook registry and project assessment.
pub mod playbook;
/// Security phase checks.
pub mod scan;
/// Workflow and phase data model.
pub mod types;

pub use bundle::ArtifactBundler;
pub use engine::WorkflowEngine;
pub use events::{WorkflowEvent, WorkflowEventStore, WorkflowSummary};
pub use playbook::{Playbook, PlaybookManager, PlaybookStep};
pub use scan::{CheckStatus, ScanCheck, ScanReport, SecurityScanner};
pub use types::{PhaseName, PhaseResult, PhaseStatus, WorkflowRecord, WorkflowStatus};
