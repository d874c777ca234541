use async_trait::async_trait;
use opsfleet_core::{Finding, Severity};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source extensions worth scanning.
const SOURCE_EXTENSIONS: &[&str] = &["rs", "py", "js", "ts", "java", "cpp", "c"];

/// A finding-producing scanner run by the background audit loops.
///
/// Contract: `analyze` never fails. A missing or unreadable file simply
/// contributes no findings; scanner bugs are the loop's problem, not the
/// caller's.
#[async_trait]
pub trait FindingScanner: Send + Sync {
    /// Scanner name, stamped on every finding it produces.
    fn name(&self) -> &str;

    /// Scan the named files (relative to the repository root).
    async fn analyze(&self, root: &Path, files: &[String]) -> Vec<Finding>;
}

fn is_source_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

async fn read_source(root: &Path, name: &str) -> Option<String> {
    if !is_source_file(name) {
        return None;
    }
    let path: PathBuf = root.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(file = name, error = %e, "skipping unreadable file");
            None
        }
    }
}

/// Flags debugging leftovers and hardcoded endpoints.
pub struct BugScanner {
    patterns: Vec<(&'static str, &'static str)>,
}

impl BugScanner {
    /// Scanner with the built-in pattern set.
    pub fn new() -> Self {
        Self {
            patterns: vec![
                ("debug print", "println!("),
                ("debug print", "dbg!("),
                ("debug print", "print("),
                ("fixme comment", "FIXME"),
                ("hardcoded localhost", "localhost"),
                ("hardcoded port", ":8000"),
                ("hardcoded database", "postgresql://"),
            ],
        }
    }
}

impl Default for BugScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindingScanner for BugScanner {
    fn name(&self) -> &str {
        "bug_hunter"
    }

    async fn analyze(&self, root: &Path, files: &[String]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in files {
            let Some(content) = read_source(root, file).await else {
                continue;
            };
            for (line_num, line) in content.lines().enumerate() {
                let lowered = line.to_lowercase();
                for (issue, pattern) in &self.patterns {
                    if lowered.contains(&pattern.to_lowercase()) {
                        findings.push(Finding::new(
                            "bug",
                            Severity::Medium,
                            file,
                            (line_num + 1) as u32,
                            *issue,
                            format!("found {issue} on line {}: {}", line_num + 1, line.trim()),
                            self.name(),
                        ));
                    }
                }
            }
        }
        findings
    }
}

/// Flags public functions with no doc comment directly above them.
pub struct DocScanner;

#[async_trait]
impl FindingScanner for DocScanner {
    fn name(&self) -> &str {
        "doc_check"
    }

    async fn analyze(&self, root: &Path, files: &[String]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in files {
            let Some(content) = read_source(root, file).await else {
                continue;
            };
            let lines: Vec<&str> = content.lines().collect();
            for (line_num, line) in lines.iter().enumerate() {
                if !line.trim_start().starts_with("pub fn ") {
                    continue;
                }
                let documented = line_num
                    .checked_sub(1)
                    .and_then(|prev| lines.get(prev))
                    .is_some_and(|prev| {
                        let prev = prev.trim_start();
                        prev.starts_with("///") || prev.starts_with("#[")
                    });
                if !documented {
                    findings.push(Finding::new(
                        "documentation",
                        Severity::Low,
                        file,
                        (line_num + 1) as u32,
                        "undocumented public function",
                        format!("public function without doc comment: {}", line.trim()),
                        self.name(),
                    ));
                }
            }
        }
        findings
    }
}

/// Flags credential-looking literals and dangerous dynamic execution.
pub struct SecretScanner {
    patterns: Vec<(&'static str, Regex)>,
}

impl SecretScanner {
    /// Scanner with the built-in pattern set. Patterns that fail to compile
    /// are dropped rather than taking the scanner down.
    pub fn new() -> Self {
        let sources: Vec<(&'static str, &'static str)> = vec![
            ("hardcoded_api_key", r#"(?i)(sk-[a-z0-9]{8,}|api[_-]?key\s*[:=]\s*["'][^"']+["'])"#),
            ("hardcoded_password", r#"(?i)password\s*[:=]\s*["'][^"']+["']"#),
            ("hardcoded_secret", r#"(?i)secret\s*[:=]\s*["'][^"']+["']"#),
            ("dangerous_eval", r"\beval\("),
            ("dangerous_exec", r"\bexec\("),
            ("hardcoded_credentials", r"postgresql://\S+:\S+@"),
        ];
        Self {
            patterns: sources
                .into_iter()
                .filter_map(|(issue, source)| Regex::new(source).ok().map(|re| (issue, re)))
                .collect(),
        }
    }

    /// Scan raw content already in memory, for callers outside the loop.
    pub fn scan_content(&self, file: &str, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            for (issue, pattern) in &self.patterns {
                if pattern.is_match(line) {
                    findings.push(Finding::new(
                        "security",
                        Severity::High,
                        file,
                        (line_num + 1) as u32,
                        *issue,
                        format!("security issue on line {}: {}", line_num + 1, line.trim()),
                        self.name(),
                    ));
                }
            }
        }
        findings
    }
}

impl Default for SecretScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindingScanner for SecretScanner {
    fn name(&self) -> &str {
        "secret_sweep"
    }

    async fn analyze(&self, root: &Path, files: &[String]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in files {
            let Some(content) = read_source(root, file).await else {
                continue;
            };
            findings.extend(self.scan_content(file, &content));
        }
        findings
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn scan_one(
        scanner: &dyn FindingScanner,
        name: &str,
        content: &str,
    ) -> Vec<Finding> {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(name), content).await.unwrap();
        scanner.analyze(dir.path(), &[name.to_string()]).await
    }

    #[tokio::test]
    async fn test_bug_scanner_flags_debug_prints() {
        let findings = scan_one(
            &BugScanner::new(),
            "main.py",
            "x = 1\nprint(x)\n",
        )
        .await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].agent, "bug_hunter");
    }

    #[tokio::test]
    async fn test_missing_file_yields_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let findings = BugScanner::new()
            .analyze(dir.path(), &["gone.py".to_string()])
            .await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_non_source_file_skipped() {
        let findings = scan_one(&BugScanner::new(), "notes.md", "print(1)\n").await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_doc_scanner_flags_undocumented_pub_fn() {
        let content = "/// Documented.\npub fn ok() {}\n\npub fn bare() {}\n";
        let findings = scan_one(&DocScanner, "lib.rs", content).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 4);
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[tokio::test]
    async fn test_secret_scanner_flags_credentials() {
        let content = "let password = \"hunter2\";\nlet url = \"postgresql://u:p@db/x\";\n";
        let findings = scan_one(&SecretScanner::new(), "config.rs", content).await;
        assert!(findings.len() >= 2);
        assert!(findings.iter().all(|f| f.severity == Severity::High));
        assert!(findings.iter().any(|f| f.issue == "hardcoded_password"));
    }

    #[test]
    fn test_scan_content_clean_input() {
        let scanner = SecretScanner::new();
        assert!(scanner.scan_content("a.rs", "let x = 1;").is_empty());
    }
}
