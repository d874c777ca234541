//! Core types and error definitions for the Opsfleet orchestration engine.
//!
//! This crate provides the foundational types shared across all Opsfleet
//! crates: the unified error enum, the task and result envelopes, the
//! worker contract, finding records, and startup configuration.
//!
//! # Main types
//!
//! - [`OpsfleetError`] — Unified error enum for all Opsfleet subsystems.
//! - [`OpsfleetResult`] — Convenience alias for `Result<T, OpsfleetError>`.
//! - [`TaskDescriptor`] — Immutable description of one unit of work.
//! - [`TaskResult`] — Canonical result envelope every delegation produces.
//! - [`Worker`] — Contract every task executor satisfies explicitly.
//! - [`Finding`] — One issue reported by an audit scanner.
//! - [`OpsfleetConfig`] — Startup configuration, read once, not hot-reloaded.

/// Startup configuration loaded from TOML.
pub mod config;
/// Error enum and result alias.
pub mod error;
/// Audit finding records and severity buckets.
pub mod finding;
/// Task descriptors, result envelopes, and raw worker output shapes.
pub mod task;
/// Tracing subscriber initialization.
pub mod telemetry;
/// Worker and workflow-dispatch contracts.
pub mod worker;

pub use config::{AuditSettings, OpsfleetConfig, WorkflowSettings};
pub use error::{OpsfleetError, OpsfleetResult};
pub use finding::{Finding, Severity};
pub use task::{TaskDescriptor, TaskResult, TaskStatus, WorkerOutput};
pub use telemetry::init_tracing;
pub use worker::{Worker, WorkflowDispatch, WorkflowOutcome};
