use crate::aggregator::AuditSummary;
use chrono::Utc;
use opsfleet_core::{Finding, OpsfleetResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FindingsFile {
    findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Durable, append-only findings log with a JSON file behind it.
///
/// All writers go through one internal lock; persistence is read-merge-write
/// so findings appended by other processes (or removed by hand) survive. A
/// failed persist is logged and the in-memory list stays intact.
pub struct FindingsStore {
    path: PathBuf,
    findings: Mutex<Vec<Finding>>,
}

impl FindingsStore {
    /// Open a store at `path`, loading any existing findings. A missing
    /// file is an empty store, not an error.
    pub async fn open(path: impl Into<PathBuf>) -> OpsfleetResult<Self> {
        let path = path.into();
        let findings = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<FindingsFile>(&raw)?.findings,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = findings.len(), "findings store opened");
        Ok(Self {
            path,
            findings: Mutex::new(findings),
        })
    }

    /// Append findings and persist. Returns the total count after append.
    pub async fn append(&self, new: Vec<Finding>) -> usize {
        let mut findings = self.findings.lock().await;
        // merge anything written to disk since the last load
        if let Ok(raw) = tokio::fs::read_to_string(&self.path).await {
            if let Ok(on_disk) = serde_json::from_str::<FindingsFile>(&raw) {
                if on_disk.findings.len() > findings.len() {
                    *findings = on_disk.findings;
                }
            }
        }
        findings.extend(new);

        let file = FindingsFile {
            findings: findings.clone(),
            last_updated: Some(Utc::now().to_rfc3339()),
        };
        if let Err(e) = write_json(&self.path, &file).await {
            warn!(path = %self.path.display(), error = %e, "failed to persist findings");
        }
        findings.len()
    }

    /// Snapshot of all findings, discovery order.
    pub async fn all(&self) -> Vec<Finding> {
        self.findings.lock().await.clone()
    }

    /// Number of findings currently held.
    pub async fn len(&self) -> usize {
        self.findings.lock().await.len()
    }

    /// Whether the store holds no findings.
    pub async fn is_empty(&self) -> bool {
        self.findings.lock().await.is_empty()
    }
}

#[derive(Serialize)]
struct AuditReport<'a> {
    audit_date: String,
    findings: &'a [Finding],
    summary: &'a AuditSummary,
}

/// Persist a dated audit report next to the findings store.
pub async fn write_audit_report(
    path: &Path,
    findings: &[Finding],
    summary: &AuditSummary,
) -> OpsfleetResult<()> {
    let report = AuditReport {
        audit_date: Utc::now().to_rfc3339(),
        findings,
        summary,
    };
    write_json(path, &report).await
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> OpsfleetResult<()> {
    let raw = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}
