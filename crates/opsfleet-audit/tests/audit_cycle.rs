//! Full audit cycle against a temporary working tree.

#![allow(clippy::unwrap_used)]

use opsfleet_audit::{
    BackgroundAuditLoop, BugScanner, DocScanner, FindingsStore, GitRunner, SafetyGate,
    SafetyPolicy, SecretScanner,
};
use opsfleet_core::AuditSettings;
use std::sync::Arc;

async fn audit_over(dir: &tempfile::TempDir, settings: AuditSettings) -> Arc<BackgroundAuditLoop> {
    let gate = Arc::new(SafetyGate::new(SafetyPolicy::from_settings(&settings)));
    let git = Arc::new(GitRunner::new(gate, dir.path()));
    let store = Arc::new(
        FindingsStore::open(dir.path().join("findings.json"))
            .await
            .unwrap(),
    );
    let audit = Arc::new(BackgroundAuditLoop::new(
        settings,
        dir.path(),
        dir.path().join("audit_report.json"),
        git,
        store,
    ));
    audit.register_scanner(Arc::new(BugScanner::new())).await;
    audit.register_scanner(Arc::new(DocScanner)).await;
    audit.register_scanner(Arc::new(SecretScanner::new())).await;
    audit
}

#[tokio::test]
async fn test_mixed_findings_score_and_report() {
    let dir = tempfile::tempdir().unwrap();
    // one high (hardcoded password), one medium (debug print), one low (bare pub fn)
    tokio::fs::write(
        dir.path().join("app.rs"),
        "pub fn run() {\n    let password = \"hunter2\";\n    dbg!(1);\n}\n",
    )
    .await
    .unwrap();

    let audit = audit_over(&dir, AuditSettings::default()).await;
    audit
        .coordinator_pass(&["app.rs".to_string()])
        .await
        .unwrap();

    let raw = tokio::fs::read_to_string(dir.path().join("audit_report.json"))
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
    // 100 - 20 (high) - 10 (medium) - 5 (low) = 65
    assert_eq!(report["summary"]["readiness_score"], 65);
    assert_eq!(report["summary"]["by_severity"]["high"], 1);
    assert_eq!(report["summary"]["by_severity"]["medium"], 1);
    assert_eq!(report["summary"]["by_severity"]["low"], 1);
    assert!(report["audit_date"].is_string());
}

#[tokio::test]
async fn test_clean_tree_reports_full_readiness() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("lib.rs"), "/// Entry.\npub fn run() {}\n")
        .await
        .unwrap();

    let audit = audit_over(&dir, AuditSettings::default()).await;
    audit
        .coordinator_pass(&["lib.rs".to_string()])
        .await
        .unwrap();

    let raw = tokio::fs::read_to_string(dir.path().join("audit_report.json"))
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(report["summary"]["readiness_score"], 100);
    assert_eq!(report["summary"]["total_findings"], 0);
}

#[tokio::test]
async fn test_findings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("app.py"), "print(1)\n")
        .await
        .unwrap();

    let audit = audit_over(&dir, AuditSettings::default()).await;
    audit
        .coordinator_pass(&["app.py".to_string()])
        .await
        .unwrap();

    let reopened = FindingsStore::open(dir.path().join("findings.json"))
        .await
        .unwrap();
    assert_eq!(reopened.len().await, 1);
    assert_eq!(reopened.all().await[0].agent, "bug_hunter");
}

#[tokio::test]
async fn test_stop_cancels_loops() {
    let dir = tempfile::tempdir().unwrap();
    let settings = AuditSettings {
        enabled: true,
        ..AuditSettings::default()
    };
    let audit = audit_over(&dir, settings).await;
    audit.start().await;
    assert!(audit.is_running());
    audit.stop().await;
    assert!(!audit.is_running());
}
