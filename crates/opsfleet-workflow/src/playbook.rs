use opsfleet_core::{OpsfleetError, OpsfleetResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Secret-looking tokens flagged during assessment.
const SECRET_TOKENS: &[&str] = &["password", "secret", "key"];

/// One step of a playbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookStep {
    /// Step kind: `apply_patch`, `scan`, `plan`, ...
    pub action: String,
    /// Human-readable step name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub details: String,
    /// Step payload, e.g. a captured diff for `apply_patch`.
    #[serde(default)]
    pub payload: String,
}

/// Serializable modernization playbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playbook {
    /// Unique identifier.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// What the playbook does.
    pub description: String,
    /// Selection tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<PlaybookStep>,
    /// `predefined` or `custom`.
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    "predefined".to_string()
}

fn predefined_playbooks() -> Vec<Playbook> {
    vec![
        Playbook {
            identifier: "dependency-refresh".to_string(),
            name: "Dependency refresh".to_string(),
            description: "Inventory pinned dependencies and flag upgrade candidates".to_string(),
            tags: vec!["dependencies".to_string(), "assessment".to_string()],
            steps: vec![PlaybookStep {
                action: "scan".to_string(),
                name: "Inventory manifests".to_string(),
                details: "Re-run the project assessment over the target tree.".to_string(),
                payload: String::new(),
            }],
            origin: "predefined".to_string(),
        },
        Playbook {
            identifier: "secret-hygiene".to_string(),
            name: "Secret hygiene".to_string(),
            description: "Plan removal of credential-looking literals from manifests".to_string(),
            tags: vec!["security".to_string()],
            steps: vec![PlaybookStep {
                action: "plan".to_string(),
                name: "Draft secret remediation".to_string(),
                details: "Move flagged values into environment configuration.".to_string(),
                payload: String::new(),
            }],
            origin: "predefined".to_string(),
        },
    ]
}

/// Registry of predefined and operator-authored playbooks.
///
/// Custom playbooks are JSON files under `<root>/playbooks/custom`; one
/// unreadable file is logged and skipped, never fatal.
pub struct PlaybookManager {
    root: PathBuf,
    playbooks: HashMap<String, Playbook>,
}

impl PlaybookManager {
    /// Manager rooted at the project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut playbooks = HashMap::new();
        for playbook in predefined_playbooks() {
            playbooks.insert(playbook.identifier.clone(), playbook);
        }

        let custom_dir = root.join("playbooks").join("custom");
        if let Ok(entries) = fs::read_dir(&custom_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match fs::read_to_string(&path)
                    .map_err(OpsfleetError::from)
                    .and_then(|raw| Ok(serde_json::from_str::<Playbook>(&raw)?))
                {
                    Ok(mut playbook) => {
                        playbook.origin = "custom".to_string();
                        playbooks.insert(playbook.identifier.clone(), playbook);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable playbook")
                    }
                }
            }
        }

        info!(count = playbooks.len(), "playbooks loaded");
        Self { root, playbooks }
    }

    /// Playbook by identifier.
    pub fn get(&self, identifier: &str) -> Option<&Playbook> {
        self.playbooks.get(identifier)
    }

    /// All playbooks, optionally filtered to those sharing a tag.
    pub fn list(&self, tags: Option<&[String]>) -> Vec<&Playbook> {
        match tags {
            None => self.playbooks.values().collect(),
            Some(tags) => {
                let wanted: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
                self.playbooks
                    .values()
                    .filter(|p| {
                        p.tags
                            .iter()
                            .any(|tag| wanted.contains(&tag.to_lowercase()))
                    })
                    .collect()
            }
        }
    }

    /// Lightweight read-only assessment of the project tree: pinned
    /// dependency candidates, credential-looking manifest lines, and CI
    /// workflow presence.
    pub fn assess_project(&self, project_root: &Path) -> OpsfleetResult<Value> {
        let mut requirement_files = Vec::new();
        let mut pin_candidates = Vec::new();
        let mut secret_suspects = Vec::new();

        for manifest in find_requirement_files(project_root) {
            let relative = manifest
                .strip_prefix(project_root)
                .unwrap_or(&manifest)
                .display()
                .to_string();
            let content = fs::read_to_string(&manifest)?;
            for line in content.lines() {
                let normalized = line.trim();
                if normalized.is_empty() || normalized.starts_with('#') {
                    continue;
                }
                let lowered = normalized.to_lowercase();
                if SECRET_TOKENS.iter().any(|token| lowered.contains(token)) {
                    secret_suspects.push(format!("{relative}:{normalized}"));
                }
                if normalized.contains("==") {
                    pin_candidates.push(normalized.to_string());
                }
            }
            requirement_files.push(relative);
        }

        let workflows_dir = project_root.join(".github").join("workflows");
        let mut ci_workflows = Vec::new();
        if let Ok(entries) = fs::read_dir(&workflows_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let extension = path.extension().and_then(|e| e.to_str());
                if matches!(extension, Some("yml") | Some("yaml")) {
                    ci_workflows.push(
                        path.strip_prefix(project_root)
                            .unwrap_or(&path)
                            .display()
                            .to_string(),
                    );
                }
            }
        }

        info!(
            manifests = requirement_files.len(),
            suspects = secret_suspects.len(),
            "project assessment complete"
        );
        Ok(json!({
            "requirements_files": requirement_files,
            "hardcoded_secret_suspects": secret_suspects,
            "pin_candidates": pin_candidates,
            "cicd_workflows_detected": ci_workflows,
        }))
    }

    /// Run every step of a playbook against `target_dir`. Unknown
    /// identifiers are an error; unsupported step actions are skipped.
    pub fn apply_playbook(&self, identifier: &str, target_dir: &Path) -> OpsfleetResult<Value> {
        let playbook = self.get(identifier).ok_or_else(|| {
            OpsfleetError::Workflow(format!("unknown playbook: {identifier}"))
        })?;

        let mut results = Vec::new();
        for step in &playbook.steps {
            let outcome = match step.action.as_str() {
                "apply_patch" => self.apply_patch(step, target_dir)?,
                "scan" => json!({
                    "step": step.name,
                    "status": "completed",
                    "data": self.assess_project(target_dir)?,
                }),
                "plan" => json!({
                    "step": step.name,
                    "status": "completed",
                    "recommendations": step.details,
                }),
                other => json!({
                    "step": step.name,
                    "status": "skipped",
                    "reason": format!("unsupported action: {other}"),
                }),
            };
            results.push(outcome);
        }
        Ok(json!({"playbook": identifier, "results": results}))
    }

    fn apply_patch(&self, step: &PlaybookStep, target_dir: &Path) -> OpsfleetResult<Value> {
        if step.payload.is_empty() {
            return Ok(json!({
                "step": step.name,
                "status": "skipped",
                "reason": "empty diff",
            }));
        }
        let patch_file = target_dir.join("_playbook_patch.diff");
        fs::write(&patch_file, &step.payload)?;
        Ok(json!({
            "step": step.name,
            "status": "generated",
            "artifact": patch_file
                .strip_prefix(&self.root)
                .unwrap_or(&patch_file)
                .display()
                .to_string(),
        }))
    }
}

/// `requirements*.txt` files anywhere under `root`, hidden and build
/// directories excluded.
fn find_requirement_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
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
            } else if name.starts_with("requirements") && name.ends_with(".txt") {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_playbooks_available() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PlaybookManager::new(dir.path());
        assert!(manager.get("dependency-refresh").is_some());
        assert!(manager.get("nope").is_none());
        assert_eq!(manager.list(None).len(), 2);
        let tagged = manager.list(Some(&["SECURITY".to_string()]));
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].identifier, "secret-hygiene");
    }

    #[test]
    fn test_custom_playbook_loaded_and_bad_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("playbooks").join("custom");
        fs::create_dir_all(&custom).unwrap();
        fs::write(
            custom.join("migrate.json"),
            r#"{"identifier": "migrate", "name": "Migrate", "description": "d"}"#,
        )
        .unwrap();
        fs::write(custom.join("broken.json"), "{not json").unwrap();

        let manager = PlaybookManager::new(dir.path());
        let migrate = manager.get("migrate").unwrap();
        assert_eq!(migrate.origin, "custom");
        assert_eq!(manager.list(None).len(), 3);
    }

    #[test]
    fn test_assessment_flags_pins_and_secrets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("requirements.txt"),
            "# comment\nrequests==2.31.0\napi_key=abc\nflask\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join(".github").join("workflows")).unwrap();
        fs::write(
            dir.path().join(".github").join("workflows").join("ci.yml"),
            "name: ci\n",
        )
        .unwrap();

        let manager = PlaybookManager::new(dir.path());
        let assessment = manager.assess_project(dir.path()).unwrap();
        assert_eq!(assessment["pin_candidates"], json!(["requests==2.31.0"]));
        assert_eq!(
            assessment["hardcoded_secret_suspects"],
            json!(["requirements.txt:api_key=abc"])
        );
        assert_eq!(
            assessment["cicd_workflows_detected"].as_array().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_apply_unknown_playbook_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PlaybookManager::new(dir.path());
        let err = manager.apply_playbook("gone", dir.path()).unwrap_err();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_apply_patch_writes_diff_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("playbooks").join("custom");
        fs::create_dir_all(&custom).unwrap();
        fs::write(
            custom.join("patch.json"),
            r#"{
                "identifier": "patch",
                "name": "Patch",
                "description": "d",
                "steps": [{"action": "apply_patch", "name": "replay", "payload": "--- a\n+++ b\n"}]
            }"#,
        )
        .unwrap();

        let manager = PlaybookManager::new(dir.path());
        let outcome = manager.apply_playbook("patch", dir.path()).unwrap();
        assert_eq!(outcome["results"][0]["status"], "generated");
        assert!(dir.path().join("_playbook_patch.diff").exists());
    }
}
