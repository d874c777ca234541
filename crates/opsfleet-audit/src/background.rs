use crate::aggregator::AuditFindingsAggregator;
use crate::git::GitRunner;
use crate::scanner::FindingScanner;
use crate::store::{write_audit_report, FindingsStore};
use opsfleet_core::{AuditSettings, OpsfleetResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Floor for the coordinator interval, seconds.
const MIN_COORDINATOR_INTERVAL: u64 = 30;
/// Floor for the per-agent interval, seconds.
const MIN_AGENT_INTERVAL: u64 = 60;
/// Cap on the error backoff, seconds.
const MAX_BACKOFF: u64 = 60;

/// Two periodic audit loops over the repository's changed files.
///
/// The coordinator loop fans changed files out to every scanner, compiles
/// a summary, and persists a dated report. The slower per-agent loop runs
/// each scanner over a bounded slice of the changed files. Both loops
/// survive any single cycle failure; `stop` cancels and awaits both.
pub struct BackgroundAuditLoop {
    settings: AuditSettings,
    root: PathBuf,
    report_path: PathBuf,
    git: Arc<GitRunner>,
    store: Arc<FindingsStore>,
    scanners: Mutex<Vec<Arc<dyn FindingScanner>>>,
    coordinator_enabled: AtomicBool,
    running: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundAuditLoop {
    /// Loop over the repository at `root`, writing reports to `report_path`.
    pub fn new(
        settings: AuditSettings,
        root: impl Into<PathBuf>,
        report_path: impl Into<PathBuf>,
        git: Arc<GitRunner>,
        store: Arc<FindingsStore>,
    ) -> Self {
        Self {
            settings,
            root: root.into(),
            report_path: report_path.into(),
            git,
            store,
            scanners: Mutex::new(Vec::new()),
            coordinator_enabled: AtomicBool::new(true),
            running: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Register a finding-producing scanner.
    pub async fn register_scanner(&self, scanner: Arc<dyn FindingScanner>) {
        self.scanners.lock().await.push(scanner);
    }

    /// Turn the coordinator pass on or off without touching the loops.
    pub fn set_coordinator_enabled(&self, enabled: bool) {
        self.coordinator_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether the loops are active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn both loops. No-op when auditing is disabled in configuration
    /// or the loops are already running.
    pub async fn start(self: &Arc<Self>) {
        if !self.settings.enabled {
            info!("background audit disabled in configuration");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let coordinator_interval = Duration::from_secs(
            self.settings
                .super_audit_interval_secs
                .max(MIN_COORDINATOR_INTERVAL),
        );
        let agent_interval = Duration::from_secs(
            self.settings
                .agent_cycle_interval_secs
                .max(MIN_AGENT_INTERVAL),
        );

        let mut handles = self.handles.lock().await;
        let this = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            this.coordinator_loop(coordinator_interval).await;
        }));
        let this = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            this.agent_loop(agent_interval).await;
        }));
        info!(
            coordinator_secs = coordinator_interval.as_secs(),
            agent_secs = agent_interval.as_secs(),
            "background audit loops started"
        );
    }

    /// Cancel both loops and await them. After this returns, no further
    /// findings are appended.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
        info!("background audit loops stopped");
    }

    async fn coordinator_loop(&self, interval: Duration) {
        while self.is_running() {
            if self.coordinator_enabled.load(Ordering::SeqCst) {
                let changed = self.git.changed_files().await;
                if !changed.is_empty() {
                    if let Err(e) = self.coordinator_pass(&changed).await {
                        error!(error = %e, "coordinator cycle failed");
                        tokio::time::sleep(backoff(interval)).await;
                        continue;
                    }
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn agent_loop(&self, interval: Duration) {
        while self.is_running() {
            let changed = self.git.changed_files().await;
            if !changed.is_empty() {
                self.agent_pass(&changed).await;
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Fan the changed files out to every scanner, then compile and persist
    /// the audit report.
    pub async fn coordinator_pass(&self, files: &[String]) -> OpsfleetResult<()> {
        let scanners = self.scanners.lock().await.clone();
        let mut collected = Vec::new();
        for scanner in &scanners {
            let findings = scanner.analyze(&self.root, files).await;
            if !findings.is_empty() {
                info!(
                    scanner = scanner.name(),
                    count = findings.len(),
                    "scanner produced findings"
                );
            }
            collected.extend(findings);
        }
        if !collected.is_empty() {
            self.store.append(collected).await;
        }

        let all = self.store.all().await;
        let summary = AuditFindingsAggregator::compile(&all);
        info!(
            total = summary.total_findings,
            readiness = summary.readiness_score,
            "audit summary compiled"
        );
        if let Err(e) = write_audit_report(&self.report_path, &all, &summary).await {
            warn!(path = %self.report_path.display(), error = %e, "failed to persist audit report");
        }
        Ok(())
    }

    /// Run each scanner over a bounded slice of the changed files.
    pub async fn agent_pass(&self, files: &[String]) {
        let limit = self.settings.max_parallel_analyses.max(1);
        let slice = &files[..files.len().min(limit)];
        let scanners = self.scanners.lock().await.clone();
        for scanner in &scanners {
            let findings = scanner.analyze(&self.root, slice).await;
            if !findings.is_empty() {
                self.store.append(findings).await;
            }
        }
    }

    /// Report root used by the loops.
    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}

fn backoff(interval: Duration) -> Duration {
    interval.min(Duration::from_secs(MAX_BACKOFF))
}
