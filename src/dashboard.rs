//! Dashboard orchestration.
//!
//! Owns the active catalog, the last raw results and the three counter
//! histories. A scan trigger awaits the backend, then applies the run under
//! one write lock. Readers take `DashboardSnapshot`s, which share the data
//! through `Arc`s and never see a half-applied run.

use crate::aggregate;
use crate::backend::ScanBackend;
use crate::catalog::{Catalog, CatalogProvider, Language};
use crate::chart::Theme;
use crate::counters::{RiskCounterSet, SeverityCounts};
use crate::errors::{ScanviewError, ScanviewResult};
use crate::models::{EnrichedIssue, RawResult, UserSettings};
use crate::remediation::RemediationGuide;
use crate::session::{self, SessionStore};
use crate::table::{SortState, TableKind, TableView};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 1-based run number
    pub run: usize,
    pub counts: SeverityCounts,
    pub results: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

#[derive(Debug)]
pub enum ScanOutcome {
    Completed(RunSummary),
    /// Another scan was still outstanding
    Ignored,
    /// The backend failed; nothing was recorded
    Failed(ScanviewError),
}

struct DashboardState {
    language: Language,
    theme: Theme,
    catalog: Arc<Catalog>,
    raw: Arc<Vec<RawResult>>,
    enriched: Arc<Vec<EnrichedIssue>>,
    counters: Arc<RiskCounterSet>,
}

/// Immutable view of the dashboard for one render pass.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub language: Language,
    pub theme: Theme,
    pub catalog: Arc<Catalog>,
    pub raw: Arc<Vec<RawResult>>,
    pub enriched: Arc<Vec<EnrichedIssue>>,
    pub counters: Arc<RiskCounterSet>,
    pub sort: Option<SortState>,
}

impl DashboardSnapshot {
    /// Only the issues table carries the persisted sort.
    pub fn table(&self, kind: TableKind) -> TableView {
        let sort = match kind {
            TableKind::Issues => self.sort,
            TableKind::Acceptable => None,
        };
        let mut table = TableView::new(kind).with_sort(sort);
        table.populate(&self.raw, &self.catalog);
        table
    }

    pub fn issues_table(&self) -> TableView {
        self.table(TableKind::Issues)
    }

    pub fn acceptable_table(&self) -> TableView {
        self.table(TableKind::Acceptable)
    }

    pub fn remediation(&self, issue_id: u32, result_id: u32) -> Option<RemediationGuide> {
        RemediationGuide::lookup(&self.catalog, issue_id, result_id)
    }
}

pub struct Dashboard<B, P> {
    backend: B,
    catalogs: P,
    state: RwLock<DashboardState>,
    scan_guard: Mutex<()>,
    session: Mutex<SessionStore>,
}

impl<B: ScanBackend, P: CatalogProvider> Dashboard<B, P> {
    /// Load settings and catalog, and restore the previous session.
    pub async fn open(
        backend: B,
        catalogs: P,
        session: SessionStore,
        language: Option<Language>,
    ) -> ScanviewResult<Self> {
        let settings = match backend.load_user_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not load user settings: {}", e);
                UserSettings::default()
            }
        };
        let language = language.unwrap_or_else(|| settings.language());
        let theme = Theme::from_setting(settings.theme.as_deref());
        let catalog = catalogs.get(language)?;
        log::info!("Dashboard opened in {} with {} catalog entries", language, catalog.len());

        let counters = session.counters();
        let raw = session.scan_result().unwrap_or_else(|e| {
            log::warn!("Discarding persisted scan result: {}", e);
            None
        });
        let enriched = session.database_data().unwrap_or_else(|e| {
            log::warn!("Discarding persisted issue data: {}", e);
            None
        });
        log::debug!("Restored {} previous runs from session", counters.runs());

        Ok(Self {
            backend,
            catalogs,
            state: RwLock::new(DashboardState {
                language,
                theme,
                catalog,
                raw: Arc::new(raw.unwrap_or_default()),
                enriched: Arc::new(enriched.unwrap_or_default()),
                counters: Arc::new(counters),
            }),
            scan_guard: Mutex::new(()),
            session: Mutex::new(session),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one scan. Ignored while another is outstanding.
    pub async fn trigger_scan(&self) -> ScanOutcome {
        let Ok(_guard) = self.scan_guard.try_lock() else {
            log::info!("Scan already in progress; ignoring trigger");
            return ScanOutcome::Ignored;
        };

        let started_at = Local::now();
        let raw = match self.backend.scan_now().await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Scan failed: {}", e);
                return ScanOutcome::Failed(e);
            }
        };

        let catalog = Arc::clone(&self.state.read().await.catalog);
        let run_counts = aggregate::tally_run(&raw, &catalog);
        let enriched = match self.backend.get_database_data(&raw).await {
            Ok(enriched) => enriched,
            Err(e) => {
                log::warn!("Backend enrichment failed, joining locally: {}", e);
                aggregate::enrich(&raw, &catalog)
            }
        };

        let results = raw.len();
        let (run, counters, raw, enriched) = {
            let mut state = self.state.write().await;
            Arc::make_mut(&mut state.counters).append(run_counts);
            state.raw = Arc::new(raw);
            state.enriched = Arc::new(enriched);
            (
                state.counters.runs(),
                Arc::clone(&state.counters),
                Arc::clone(&state.raw),
                Arc::clone(&state.enriched),
            )
        };

        if let Err(e) = self.persist_run(&counters, &raw, &enriched).await {
            log::error!("Could not persist session state: {}", e);
        }

        let summary = RunSummary {
            run,
            counts: run_counts.overall,
            results,
            started_at,
            finished_at: Local::now(),
        };
        log::info!(
            "Run {} recorded: {} results, {} concerns",
            summary.run,
            summary.results,
            summary.counts.concerns()
        );
        ScanOutcome::Completed(summary)
    }

    async fn persist_run(
        &self,
        counters: &RiskCounterSet,
        raw: &[RawResult],
        enriched: &[EnrichedIssue],
    ) -> ScanviewResult<()> {
        let mut session = self.session.lock().await;
        session.set(session::SCAN_RESULT, raw)?;
        session.set_counters(counters)?;
        session.set(session::DATABASE_DATA, enriched)?;
        session.flush()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let sort = self.session.lock().await.issues_sorted();
        let state = self.state.read().await;
        DashboardSnapshot {
            language: state.language,
            theme: state.theme,
            catalog: Arc::clone(&state.catalog),
            raw: Arc::clone(&state.raw),
            enriched: Arc::clone(&state.enriched),
            counters: Arc::clone(&state.counters),
            sort,
        }
    }

    /// Remember the issues table sort for later rebuilds.
    pub async fn save_sort(&self, sort: SortState) -> ScanviewResult<()> {
        let mut session = self.session.lock().await;
        session.set(session::ISSUES_SORTED, &sort)?;
        session.flush()
    }

    pub async fn set_language(&self, language: Language) -> ScanviewResult<()> {
        let catalog = self.catalogs.get(language)?;
        let mut state = self.state.write().await;
        state.language = language;
        state.catalog = catalog;
        log::info!("Switched dashboard language to {}", language);
        Ok(())
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.state.write().await.theme = theme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixtures, StaticCatalogProvider};
    use crate::table::{SortColumn, TableAction, TableEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Serves queued scan results; `None` entries fail.
    struct ScriptedBackend {
        runs: std::sync::Mutex<Vec<Option<Vec<RawResult>>>>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(runs: Vec<Option<Vec<RawResult>>>) -> Self {
            Self {
                runs: std::sync::Mutex::new(runs),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ScanBackend for ScriptedBackend {
        async fn scan_now(&self) -> ScanviewResult<Vec<RawResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
            let next = {
                let mut runs = self
                    .runs
                    .lock()
                    .map_err(|e| ScanviewError::external("runs", e.to_string()))?;
                if runs.is_empty() {
                    None
                } else {
                    runs.remove(0)
                }
            };
            next.ok_or_else(|| ScanviewError::BackendUnavailable("host offline".into()))
        }

        async fn get_database_data(
            &self,
            _results: &[RawResult],
        ) -> ScanviewResult<Vec<EnrichedIssue>> {
            Err(ScanviewError::BackendUnavailable("no enrichment".into()))
        }

        async fn load_user_settings(&self) -> ScanviewResult<UserSettings> {
            Ok(UserSettings::default())
        }
    }

    fn provider() -> StaticCatalogProvider {
        StaticCatalogProvider::new().with_catalog(fixtures::catalog())
    }

    fn results(pairs: &[(u32, u32)]) -> Vec<RawResult> {
        pairs.iter().map(|&(i, r)| RawResult::new(i, r)).collect()
    }

    async fn open(
        backend: ScriptedBackend,
    ) -> ScanviewResult<Dashboard<ScriptedBackend, StaticCatalogProvider>> {
        Dashboard::open(backend, provider(), SessionStore::in_memory(), None).await
    }

    type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

    #[tokio::test]
    async fn test_runs_accumulate_in_order() -> ScanviewResult<()> {
        let backend = ScriptedBackend::new(vec![
            Some(results(&[(15, 1), (5, 1)])),
            Some(results(&[(15, 1), (20, 1), (21, 0), (15, 0)])),
        ]);
        let dashboard = open(backend).await?;

        assert!(matches!(dashboard.trigger_scan().await, ScanOutcome::Completed(s) if s.run == 1));
        assert!(matches!(dashboard.trigger_scan().await, ScanOutcome::Completed(s) if s.run == 2));

        let snapshot = dashboard.snapshot().await;
        let overall = &snapshot.counters.overall;
        assert_eq!(overall.all_high_risks(), &[1, 1]);
        assert_eq!(overall.all_medium_risks(), &[0, 1]);
        assert_eq!(overall.all_low_risks(), &[1, 0]);
        assert_eq!(overall.all_info_risks(), &[0, 1]);
        assert_eq!(overall.all_no_risks(), &[0, 1]);
        assert_eq!(snapshot.counters.security.len(), 2);
        assert_eq!(snapshot.counters.privacy.len(), 2);
        // Enrichment fell back to the local catalog join.
        assert_eq!(snapshot.enriched.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_store_untouched() -> ScanviewResult<()> {
        let backend = ScriptedBackend::new(vec![Some(results(&[(15, 1)])), None]);
        let dashboard = open(backend).await?;

        dashboard.trigger_scan().await;
        let before = dashboard.snapshot().await;
        assert!(matches!(
            dashboard.trigger_scan().await,
            ScanOutcome::Failed(ScanviewError::BackendUnavailable(_))
        ));
        let after = dashboard.snapshot().await;
        assert_eq!(*after.counters, *before.counters);
        assert_eq!(after.raw, before.raw);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_trigger_is_ignored_while_scanning() -> ScanviewResult<()> {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let mut backend =
            ScriptedBackend::new(vec![Some(results(&[(5, 1)])), Some(results(&[(5, 1)]))]);
        backend.gate = Some((Arc::clone(&started), Arc::clone(&release)));
        let dashboard = open(backend).await?;

        let (first, second) = tokio::join!(dashboard.trigger_scan(), async {
            started.notified().await;
            let outcome = dashboard.trigger_scan().await;
            release.notify_one();
            outcome
        });

        assert!(matches!(first, ScanOutcome::Completed(_)));
        assert!(matches!(second, ScanOutcome::Ignored));
        assert_eq!(dashboard.backend().calls.load(Ordering::SeqCst), 1);
        assert_eq!(dashboard.snapshot().await.counters.runs(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_runs() -> ScanviewResult<()> {
        let backend =
            ScriptedBackend::new(vec![Some(results(&[(5, 1)])), Some(results(&[(15, 1)]))]);
        let dashboard = open(backend).await?;
        dashboard.trigger_scan().await;

        let held = dashboard.snapshot().await;
        dashboard.trigger_scan().await;

        assert_eq!(held.counters.runs(), 1);
        assert_eq!(dashboard.snapshot().await.counters.runs(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_restores_counters_and_sort() -> TestResult {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("session.json");

        let scan = results(&[(15, 1), (5, 1), (20, 1), (15, 0), (5, 0)]);
        let backend = ScriptedBackend::new(vec![Some(scan)]);
        let session = SessionStore::open(&path)?;
        let dashboard = Dashboard::open(backend, provider(), session, None).await?;
        dashboard.trigger_scan().await;

        let mut table = dashboard.snapshot().await.issues_table();
        let clicked = table.handle(TableEvent::HeaderClicked(SortColumn::Risk));
        if let Some(TableAction::Sorted(sort)) = clicked {
            dashboard.save_sort(sort).await?;
        }

        let reopened = Dashboard::open(
            ScriptedBackend::new(vec![]),
            provider(),
            SessionStore::open(&path)?,
            None,
        )
        .await?;
        let snapshot = reopened.snapshot().await;
        assert_eq!(snapshot.counters.runs(), 1);

        let ids: Vec<u32> = snapshot.issues_table().rows().iter().map(|r| r.issue_id).collect();
        assert_eq!(ids, vec![5, 20, 15]);

        let acceptable = snapshot.acceptable_table();
        assert!(acceptable.sort_state().is_none());
        let names: Vec<&str> = acceptable.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Firewall enabled", "Cookies blocked"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_remediation_from_snapshot() -> ScanviewResult<()> {
        let backend = ScriptedBackend::new(vec![Some(results(&[(15, 1)]))]);
        let dashboard = open(backend).await?;
        dashboard.trigger_scan().await;

        let snapshot = dashboard.snapshot().await;
        let mut table = snapshot.issues_table();
        let clicked = table.handle(TableEvent::RowClicked(0));
        let Some(TableAction::OpenIssue { issue_id, result_id }) = clicked else {
            panic!("row click should open the issue");
        };
        let guide = snapshot.remediation(issue_id, result_id);
        assert_eq!(guide.map(|g| g.name), Some("Firewall disabled".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_language_catalog_is_an_error() {
        let backend = ScriptedBackend::new(vec![]);
        let result = Dashboard::open(
            backend,
            StaticCatalogProvider::new(),
            SessionStore::in_memory(),
            Some(Language::Spanish),
        )
        .await;
        assert!(matches!(result, Err(ScanviewError::CatalogUnavailable(Language::Spanish))));
    }
}
