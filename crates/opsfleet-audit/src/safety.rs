use opsfleet_core::AuditSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Read-only command prefixes allowed regardless of the mutation flag.
const DEFAULT_READ_ONLY_PREFIXES: &[&str] =
    &["git status", "git status --porcelain", "git remote -v"];

/// Immutable command policy, read once at gate construction.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    allowed_read_only_prefixes: Vec<String>,
    allow_mutating_commands: bool,
}

impl SafetyPolicy {
    /// Policy from configuration: the built-in read-only prefixes plus any
    /// operator-supplied extras, and the mutation flag.
    pub fn from_settings(settings: &AuditSettings) -> Self {
        let mut prefixes: Vec<String> = DEFAULT_READ_ONLY_PREFIXES
            .iter()
            .map(|p| (*p).to_string())
            .collect();
        prefixes.extend(settings.allowed_read_only_commands.iter().cloned());
        Self {
            allowed_read_only_prefixes: prefixes,
            allow_mutating_commands: settings.allow_git_mutations,
        }
    }

    /// Built-in prefixes only, mutations denied.
    pub fn read_only() -> Self {
        Self::from_settings(&AuditSettings::default())
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::read_only()
    }
}

/// Decides whether a proposed external command may execute.
///
/// Fail closed: anything that is not an allow-listed read-only prefix is
/// denied unless mutations are explicitly permitted. Denials increment a
/// counter so policy friction is visible without reading logs.
#[derive(Debug)]
pub struct SafetyGate {
    policy: SafetyPolicy,
    denied: AtomicU64,
}

impl SafetyGate {
    /// Gate over the given policy.
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            policy,
            denied: AtomicU64::new(0),
        }
    }

    /// Whether the command may execute.
    pub fn is_command_allowed(&self, command: &str) -> bool {
        let command = command.trim();
        if self
            .policy
            .allowed_read_only_prefixes
            .iter()
            .any(|prefix| command.starts_with(prefix.as_str()))
        {
            return true;
        }
        if self.policy.allow_mutating_commands {
            return true;
        }
        self.denied.fetch_add(1, Ordering::Relaxed);
        warn!(command, "command denied by safety policy");
        false
    }

    /// Number of commands denied since construction.
    pub fn denied_count(&self) -> u64 {
        self.denied.load(Ordering::Relaxed)
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(SafetyPolicy::default())
    }
}
