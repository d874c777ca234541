use crate::error::{OpsfleetError, OpsfleetResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, read once at startup. Not hot-reloaded by this
/// subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsfleetConfig {
    /// Background audit loop settings and safety policy inputs.
    #[serde(default)]
    pub audit: AuditSettings,
    /// Modernization workflow settings.
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

impl OpsfleetConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> OpsfleetResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| OpsfleetError::Config(format!("invalid config {}: {e}", path.display())))
    }
}

/// Settings for the background audit loops and the safety gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Master switch; `start()` is a no-op when false.
    #[serde(default)]
    pub enabled: bool,
    /// Coordinator loop interval in seconds, clamped to at least 30 at use.
    #[serde(default = "default_super_audit_interval")]
    pub super_audit_interval_secs: u64,
    /// Per-agent loop interval in seconds, clamped to at least 60 at use.
    #[serde(default = "default_agent_cycle_interval")]
    pub agent_cycle_interval_secs: u64,
    /// Maximum changed files handed to each scanner per agent cycle.
    #[serde(default = "default_max_parallel_analyses")]
    pub max_parallel_analyses: usize,
    /// Whether mutating git commands may pass the safety gate.
    #[serde(default)]
    pub allow_git_mutations: bool,
    /// Extra read-only command prefixes allowed beyond the built-in git
    /// set. Extension point; empty by default.
    #[serde(default)]
    pub allowed_read_only_commands: Vec<String>,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            super_audit_interval_secs: default_super_audit_interval(),
            agent_cycle_interval_secs: default_agent_cycle_interval(),
            max_parallel_analyses: default_max_parallel_analyses(),
            allow_git_mutations: false,
            allowed_read_only_commands: Vec::new(),
        }
    }
}

fn default_super_audit_interval() -> u64 {
    300
}

fn default_agent_cycle_interval() -> u64 {
    600
}

fn default_max_parallel_analyses() -> usize {
    2
}

/// Settings for the modernization workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// External test command run by the testing phase; exit code zero means
    /// the phase completed.
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,
    /// Dependency audit command for the security phase. The check is
    /// skipped when the binary is missing.
    #[serde(default = "default_audit_command")]
    pub audit_command: Vec<String>,
    /// Directory packaging bundles are written under.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            test_command: default_test_command(),
            audit_command: default_audit_command(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_test_command() -> Vec<String> {
    vec!["cargo".to_string(), "test".to_string(), "--quiet".to_string()]
}

fn default_audit_command() -> Vec<String> {
    vec!["cargo".to_string(), "audit".to_string()]
}

fn default_output_dir() -> String {
    "modernization_bundles".to_string()
}
