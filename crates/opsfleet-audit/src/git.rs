use crate::safety::SafetyGate;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs gated git commands against a working directory.
///
/// Every invocation goes through the [`SafetyGate`] first. Denied commands
/// and subprocess failures both come back as an empty string; callers treat
/// empty output as "nothing to do", never as a reason to retry.
pub struct GitRunner {
    gate: Arc<SafetyGate>,
    workdir: PathBuf,
}

impl GitRunner {
    /// Runner rooted at `workdir`.
    pub fn new(gate: Arc<SafetyGate>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            gate,
            workdir: workdir.into(),
        }
    }

    /// Run a shell command and return its trimmed stdout, or an empty
    /// string if the gate denies it or the process fails.
    pub async fn run(&self, command: &str) -> String {
        let command = command.trim();
        if !self.gate.is_command_allowed(command) {
            return String::new();
        }

        let result = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            Ok(output) => {
                debug!(
                    command,
                    code = output.status.code(),
                    "git command exited non-zero"
                );
                String::new()
            }
            Err(e) => {
                error!(command, error = %e, "git command failed to spawn");
                String::new()
            }
        }
    }

    /// Changed files in the working tree, via a gated porcelain status.
    pub async fn changed_files(&self) -> Vec<String> {
        let output = self.run("git status --porcelain").await;
        let files = parse_porcelain(&output);
        if !files.is_empty() {
            info!(count = files.len(), "changed files detected");
        }
        files
    }
}

/// Extract top-level, non-hidden filenames from `git status --porcelain`
/// output. Files in subdirectories are out of scope for the audit loops.
pub fn parse_porcelain(output: &str) -> Vec<String> {
    let mut files = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let Some(_status) = parts.next() else {
            continue;
        };
        let Some(name) = parts.next() else {
            continue;
        };
        if name.starts_with('.') && !name.starts_with("./") {
            continue;
        }
        let name = name.strip_prefix("./").unwrap_or(name);
        if name.is_empty() || name.starts_with('.') || name.contains('/') {
            continue;
        }
        files.push(name.to_string());
    }
    files
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::safety::SafetyPolicy;

    #[test]
    fn test_parse_porcelain_top_level_only() {
        let output = " M src/lib.rs\n M main.py\n?? notes.md\n M .env\n";
        assert_eq!(parse_porcelain(output), vec!["main.py", "notes.md"]);
    }

    #[test]
    fn test_parse_porcelain_strips_dot_slash() {
        assert_eq!(parse_porcelain("M ./config.toml"), vec!["config.toml"]);
    }

    #[test]
    fn test_parse_porcelain_empty_and_malformed() {
        assert!(parse_porcelain("").is_empty());
        assert!(parse_porcelain("M\n\n  \n").is_empty());
    }

    #[tokio::test]
    async fn test_denied_command_yields_empty_output() {
        let gate = Arc::new(SafetyGate::new(SafetyPolicy::read_only()));
        let runner = GitRunner::new(Arc::clone(&gate), ".");
        assert_eq!(runner.run("git push --force").await, "");
        assert_eq!(gate.denied_count(), 1);
    }

    #[tokio::test]
    async fn test_allowed_command_runs() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(SafetyGate::default());
        let runner = GitRunner::new(gate, dir.path());
        // not a git repository; failure still comes back as empty, not Err
        let output = runner.run("git status --porcelain").await;
        assert_eq!(output, "");
    }
}
