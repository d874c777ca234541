use opsfleet_audit::SecretScanner;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one security sub-check. A skipped check is not clean: the
/// overall scan only passes when every check actually ran and came back ok.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Ran and found nothing.
    Ok,
    /// Could not run (missing tool).
    Skipped,
    /// Ran and found something.
    Attention,
}

/// One named sub-check with structured detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCheck {
    /// Which tool produced the result.
    pub tool: String,
    /// How the check ended.
    pub status: CheckStatus,
    /// Tool-specific detail.
    pub details: Value,
}

/// Aggregate result over all sub-checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// `ok` only when every check is `ok`.
    pub status: CheckStatus,
    /// Individual check results.
    pub checks: Vec<ScanCheck>,
}

impl ScanReport {
    /// Whether the security gate passes.
    pub fn is_clean(&self) -> bool {
        self.status == CheckStatus::Ok
    }
}

/// Aggregated dependency audit plus secret sweep for the security phase.
pub struct SecurityScanner {
    audit_command: Vec<String>,
    secrets: SecretScanner,
}

impl SecurityScanner {
    /// Scanner that runs `audit_command` (program plus args) for the
    /// dependency check.
    pub fn new(audit_command: Vec<String>) -> Self {
        Self {
            audit_command,
            secrets: SecretScanner::new(),
        }
    }

    /// Run all checks over the project tree.
    pub async fn run_scans(&self, project_root: &Path) -> ScanReport {
        let checks = vec![
            self.dependency_audit(project_root).await,
            self.secret_sweep(project_root).await,
        ];
        let status = if checks.iter().all(|c| c.status == CheckStatus::Ok) {
            CheckStatus::Ok
        } else {
            CheckStatus::Attention
        };
        info!(?status, checks = checks.len(), "security scan finished");
        ScanReport { status, checks }
    }

    async fn dependency_audit(&self, project_root: &Path) -> ScanCheck {
        let Some((program, args)) = self.audit_command.split_first() else {
            return ScanCheck {
                tool: "dependency-audit".to_string(),
                status: CheckStatus::Skipped,
                details: json!({"reason": "no audit command configured"}),
            };
        };
        let tool = program.clone();

        let result = tokio::process::Command::new(program)
            .args(args)
            .current_dir(project_root)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => ScanCheck {
                tool,
                status: CheckStatus::Ok,
                details: json!({"return_code": 0}),
            },
            Ok(output) => ScanCheck {
                tool,
                status: CheckStatus::Attention,
                details: json!({
                    "return_code": output.status.code(),
                    "stderr": String::from_utf8_lossy(&output.stderr).trim(),
                }),
            },
            Err(e) => {
                warn!(tool, error = %e, "dependency audit tool unavailable");
                ScanCheck {
                    tool,
                    status: CheckStatus::Skipped,
                    details: json!({"reason": e.to_string()}),
                }
            }
        }
    }

    async fn secret_sweep(&self, project_root: &Path) -> ScanCheck {
        let mut suspicious = Vec::new();
        for file in source_files(project_root) {
            let Ok(content) = tokio::fs::read_to_string(&file).await else {
                continue;
            };
            let name = file
                .strip_prefix(project_root)
                .unwrap_or(&file)
                .display()
                .to_string();
            if !self.secrets.scan_content(&name, &content).is_empty() {
                suspicious.push(name);
            }
        }
        suspicious.sort();

        ScanCheck {
            tool: "secret-sweep".to_string(),
            status: if suspicious.is_empty() {
                CheckStatus::Ok
            } else {
                CheckStatus::Attention
            },
            details: json!({"findings": suspicious}),
        }
    }
}

fn source_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_dir() {
                if !name.starts_with('.') && name != "target" && name != "node_modules" {
                    pending.push(path);
                }
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("rs") | Some("py")
            ) {
                found.push(path);
            }
        }
    }
    found
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_tree_passes() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("lib.rs"), "pub fn ok() {}\n")
            .await
            .unwrap();
        let scanner = SecurityScanner::new(vec!["true".to_string()]);
        let report = scanner.run_scans(dir.path()).await;
        assert!(report.is_clean());
        assert_eq!(report.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_secret_finding_demands_attention() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("config.py"),
            "password = \"hunter2\"\n",
        )
        .await
        .unwrap();
        let scanner = SecurityScanner::new(vec!["true".to_string()]);
        let report = scanner.run_scans(dir.path()).await;
        assert!(!report.is_clean());
        let sweep = report
            .checks
            .iter()
            .find(|c| c.tool == "secret-sweep")
            .unwrap();
        assert_eq!(sweep.status, CheckStatus::Attention);
        assert_eq!(sweep.details["findings"], json!(["config.py"]));
    }

    #[tokio::test]
    async fn test_failing_audit_command_demands_attention() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = SecurityScanner::new(vec!["false".to_string()]);
        let report = scanner.run_scans(dir.path()).await;
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_missing_audit_tool_is_skipped_not_clean() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = SecurityScanner::new(vec!["definitely-not-a-real-tool-xyz".to_string()]);
        let report = scanner.run_scans(dir.path()).await;
        let dep = report.checks.first().unwrap();
        assert_eq!(dep.status, CheckStatus::Skipped);
        assert!(!report.is_clean());
    }
}
