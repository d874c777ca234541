//! Autonomous repository auditing with a hard safety perimeter.
//!
//! Two background loops watch the working tree for changes, run finding
//! scanners over the changed files, and keep a persisted findings log plus
//! a readiness score. Every external command the loops run passes through
//! a fail-closed [`SafetyGate`] first; by default only plain read-only git
//! inspection is permitted.
//!
//! # Main types
//!
//! - [`SafetyGate`] — allow-list command policy with a denial counter.
//! - [`GitRunner`] — gated subprocess runner and porcelain parser.
//! - [`FindingScanner`] — contract for finding producers, with the built-in
//!   [`BugScanner`], [`DocScanner`], and [`SecretScanner`].
//! - [`FindingsStore`] — durable append-only findings log.
//! - [`AuditFindingsAggregator`] — summary and readiness score.
//! - [`BackgroundAuditLoop`] — the coordinator and per-agent loops.

/// Finding aggregation and readiness scoring.
pub mod aggregator;
/// The periodic audit loops.
pub mod background;
/// Gated git subprocess access.
pub mod git;
/// Command safety policy.
pub mod safety;
/// Built-in finding scanners.
pub mod scanner;
/// Findings persistence.
pub mod store;

pub use aggregator::{AuditFindingsAggregator, AuditSummary};
pub use background::BackgroundAuditLoop;
pub use git::{parse_porcelain, GitRunner};
pub use safety::{SafetyGate, SafetyPolicy};
pub use scanner::{BugScanner, DocScanner, FindingScanner, SecretScanner};
pub use store::{write_audit_report, FindingsStore};
