use crate::backend::ScanBackend;
use crate::catalog::CatalogProvider;
use crate::dashboard::{Dashboard, ScanOutcome};
use crate::errors::ScanviewResult;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Triggers a dashboard run whenever the host rewrites its results file.
pub struct ResultsWatcher {
    path: PathBuf,
    tx: mpsc::Sender<notify::Result<Event>>,
}

impl ResultsWatcher {
    pub fn new(path: impl Into<PathBuf>) -> (Self, mpsc::Receiver<notify::Result<Event>>) {
        let (tx, rx) = mpsc::channel(100);
        (
            Self {
                path: path.into(),
                tx,
            },
            rx,
        )
    }

    pub async fn watch<B, P, F, Fut>(
        &self,
        dashboard: &Dashboard<B, P>,
        mut rx: mpsc::Receiver<notify::Result<Event>>,
        mut on_run: F,
    ) -> ScanviewResult<()>
    where
        B: ScanBackend,
        P: CatalogProvider,
        F: FnMut(ScanOutcome) -> Fut,
        Fut: Future<Output = ()>,
    {
        log::info!("Starting Watch Mode on: {:?}", self.path);

        let tx_clone = self.tx.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                // Runs on notify's thread
                let _ = tx_clone.blocking_send(res);
            },
            Config::default(),
        )?;

        // Watch the parent so atomic replace-by-rename is still seen.
        let target = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher.watch(target, RecursiveMode::NonRecursive)?;

        while let Some(res) = rx.recv().await {
            match res {
                Ok(event) if self.is_relevant(&event) => {
                    log::debug!("Results changed: {:?}", event.kind);
                    let outcome = dashboard.trigger_scan().await;
                    on_run(outcome).await;
                }
                Ok(_) => {}
                Err(e) => log::error!("Watch error: {:?}", e),
            }
        }

        Ok(())
    }

    fn is_relevant(&self, event: &Event) -> bool {
        let touches_results = event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == self.path.file_name());
        touches_results && matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_only_results_file_changes_trigger() {
        let (watcher, _rx) = ResultsWatcher::new("/tmp/host/results.json");
        let results = "/tmp/host/results.json";
        let other = "/tmp/host/other.json";
        assert!(watcher.is_relevant(&event(EventKind::Modify(ModifyKind::Any), results)));
        assert!(watcher.is_relevant(&event(EventKind::Create(CreateKind::File), results)));
        assert!(!watcher.is_relevant(&event(EventKind::Modify(ModifyKind::Any), other)));
        assert!(!watcher.is_relevant(&event(EventKind::Remove(RemoveKind::File), results)));
    }
}
