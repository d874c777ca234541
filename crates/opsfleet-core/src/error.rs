use thiserror::Error;

/// A convenience `Result` alias using [`OpsfleetError`].
pub type OpsfleetResult<T> = Result<T, OpsfleetError>;

/// Top-level error type for the Opsfleet engine.
///
/// Each variant corresponds to a subsystem that can produce errors. Note
/// that "no capable worker" and "blocked phase" are expected runtime
/// conditions surfaced as result values, not as variants here.
#[derive(Error, Debug)]
pub enum OpsfleetError {
    /// An error inside the task orchestrator itself.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// An error raised by a worker while starting or executing a task.
    #[error("Worker error: {0}")]
    Worker(String),

    /// An error inside the modernization workflow engine.
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// An error in the background audit subsystem.
    #[error("Audit error: {0}")]
    Audit(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
