//! Scanning backend bridge.
//!
//! The actual system checks run in an external host process. This module
//! only asks for their JSON output, either by invoking the host program or
//! by reading files it wrote.

use crate::aggregate;
use crate::catalog::{Catalog, CatalogProvider, Language};
use crate::errors::{ScanviewError, ScanviewResult};
use crate::models::{EnrichedIssue, RawResult, UserSettings};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const DEFAULT_HOST_TIMEOUT: Duration = Duration::from_secs(120);

/// Calls consumed from the scanning backend.
pub trait ScanBackend: Send + Sync {
    /// Trigger a fresh scan.
    fn scan_now(&self) -> impl Future<Output = ScanviewResult<Vec<RawResult>>> + Send;

    /// Join results with full issue text on the backend side.
    fn get_database_data(
        &self,
        results: &[RawResult],
    ) -> impl Future<Output = ScanviewResult<Vec<EnrichedIssue>>> + Send;

    fn load_user_settings(&self) -> impl Future<Output = ScanviewResult<UserSettings>> + Send;
}

/// Invokes the native host program as `<program> <Command>`; the host
/// prints JSON on stdout and, for `GetDataBaseData`, reads JSON on stdin.
#[derive(Debug, Clone)]
pub struct HostProcessBackend {
    program: PathBuf,
    timeout: Duration,
}

impl HostProcessBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_HOST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        command: &str,
        input: Option<String>,
    ) -> ScanviewResult<T> {
        log::debug!("Calling host {:?} {}", self.program, command);
        let mut child = Command::new(&self.program)
            .arg(command)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScanviewError::BackendUnavailable(format!("{:?}: {}", self.program, e)))?;

        if let (Some(payload), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin
                .write_all(payload.as_bytes())
                .await
                .map_err(|e| ScanviewError::BackendUnavailable(format!("{}: {}", command, e)))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                ScanviewError::BackendUnavailable(format!(
                    "{} timed out after {}s",
                    command,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ScanviewError::BackendUnavailable(format!("{}: {}", command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanviewError::BackendUnavailable(format!(
                "{} exited with {}: {}",
                command,
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            ScanviewError::BackendUnavailable(format!("{} returned bad JSON: {}", command, e))
        })
    }
}

impl ScanBackend for HostProcessBackend {
    async fn scan_now(&self) -> ScanviewResult<Vec<RawResult>> {
        self.call("ScanNow", None).await
    }

    async fn get_database_data(&self, results: &[RawResult]) -> ScanviewResult<Vec<EnrichedIssue>> {
        let payload = serde_json::to_string(results)?;
        self.call("GetDataBaseData", Some(payload)).await
    }

    async fn load_user_settings(&self) -> ScanviewResult<UserSettings> {
        self.call("LoadUserSettings", None).await
    }
}

/// Reads results the host already wrote to disk. Enrichment is done
/// locally against `catalog` when one is attached.
#[derive(Debug, Clone)]
pub struct FileBackend {
    results: PathBuf,
    settings: Option<PathBuf>,
    catalog: Option<std::sync::Arc<Catalog>>,
}

impl FileBackend {
    pub fn new(results: impl Into<PathBuf>) -> Self {
        Self {
            results: results.into(),
            settings: None,
            catalog: None,
        }
    }

    pub fn with_settings(mut self, settings: impl Into<PathBuf>) -> Self {
        self.settings = Some(settings.into());
        self
    }

    pub fn with_catalog(mut self, catalog: std::sync::Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Attach the catalog for `language`, or for the language in the
    /// user settings when none is given.
    pub async fn attach_catalog<P: CatalogProvider>(
        self,
        catalogs: &P,
        language: Option<Language>,
    ) -> ScanviewResult<Self> {
        let language = match language {
            Some(language) => language,
            None => self
                .load_user_settings()
                .await
                .map(|settings| settings.language())
                .unwrap_or(Language::English),
        };
        let catalog = catalogs.get(language)?;
        Ok(self.with_catalog(catalog))
    }

    pub fn results_path(&self) -> &Path {
        &self.results
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> ScanviewResult<T> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScanviewError::BackendUnavailable(format!("{:?}: {}", path, e)))?;
        serde_json::from_str(&json)
            .map_err(|e| ScanviewError::BackendUnavailable(format!("{:?}: {}", path, e)))
    }
}

impl ScanBackend for FileBackend {
    async fn scan_now(&self) -> ScanviewResult<Vec<RawResult>> {
        Self::read_json(&self.results).await
    }

    async fn get_database_data(&self, results: &[RawResult]) -> ScanviewResult<Vec<EnrichedIssue>> {
        match &self.catalog {
            Some(catalog) => Ok(aggregate::enrich(results, catalog)),
            None => Err(ScanviewError::BackendUnavailable(
                "file backend has no catalog for enrichment".into(),
            )),
        }
    }

    async fn load_user_settings(&self) -> ScanviewResult<UserSettings> {
        match &self.settings {
            Some(path) => Self::read_json(path).await,
            None => Ok(UserSettings::default()),
        }
    }
}

/// Backend picked at startup from the command line.
#[derive(Debug, Clone)]
pub enum Backend {
    File(FileBackend),
    Host(HostProcessBackend),
}

impl ScanBackend for Backend {
    async fn scan_now(&self) -> ScanviewResult<Vec<RawResult>> {
        match self {
            Backend::File(b) => b.scan_now().await,
            Backend::Host(b) => b.scan_now().await,
        }
    }

    async fn get_database_data(&self, results: &[RawResult]) -> ScanviewResult<Vec<EnrichedIssue>> {
        match self {
            Backend::File(b) => b.get_database_data(results).await,
            Backend::Host(b) => b.get_database_data(results).await,
        }
    }

    async fn load_user_settings(&self) -> ScanviewResult<UserSettings> {
        match self {
            Backend::File(b) => b.load_user_settings().await,
            Backend::Host(b) => b.load_user_settings().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixtures, StaticCatalogProvider};
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

    #[tokio::test]
    async fn test_file_backend_reads_results() -> TestResult {
        let dir = TempDir::new()?;
        let results = dir.path().join("results.json");
        let settings = dir.path().join("settings.json");
        std::fs::write(&results, r#"[{"issue_id":5,"result_id":1},{"issue_id":15,"result_id":0}]"#)?;
        std::fs::write(&settings, r#"{"Language":2}"#)?;

        let backend = FileBackend::new(&results)
            .with_settings(&settings)
            .with_catalog(std::sync::Arc::new(fixtures::catalog()));

        let raw = backend.scan_now().await?;
        assert_eq!(raw.len(), 2);

        let enriched = backend.get_database_data(&raw).await?;
        assert_eq!(enriched.len(), 2);

        let user = backend.load_user_settings().await?;
        assert_eq!(user.language, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_attach_catalog_follows_settings_language() -> TestResult {
        let dir = TempDir::new()?;
        let settings = dir.path().join("settings.json");
        std::fs::write(&settings, r#"{"Language":1}"#)?;

        let dutch = Catalog::from_json_str(
            Language::Dutch,
            r#"{"15":{"1":{"Name":"Firewall uit","Type":"Security","Severity":3}}}"#,
        )?;
        let provider = StaticCatalogProvider::new()
            .with_catalog(fixtures::catalog())
            .with_catalog(dutch);

        let backend = FileBackend::new(dir.path().join("results.json"))
            .with_settings(&settings)
            .attach_catalog(&provider, None)
            .await?;
        let enriched = backend.get_database_data(&[RawResult::new(15, 1)]).await?;
        assert_eq!(enriched.len(), 1);
        assert_eq!(backend.catalog.as_ref().map(|c| c.language()), Some(Language::Dutch));

        let english = FileBackend::new("results.json")
            .attach_catalog(&provider, Some(Language::English))
            .await?;
        assert_eq!(english.catalog.as_ref().map(|c| c.language()), Some(Language::English));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_results_file_is_backend_unavailable() {
        let backend = FileBackend::new("/no/such/results.json");
        assert!(matches!(
            backend.scan_now().await,
            Err(ScanviewError::BackendUnavailable(_))
        ));
        assert!(backend.get_database_data(&[]).await.is_err());
        assert_eq!(backend.load_user_settings().await.ok(), Some(UserSettings::default()));
    }

    #[tokio::test]
    async fn test_missing_host_program_is_backend_unavailable() {
        let backend = HostProcessBackend::new("/no/such/host-bridge")
            .with_timeout(Duration::from_secs(5));
        assert!(matches!(
            backend.scan_now().await,
            Err(ScanviewError::BackendUnavailable(_))
        ));
    }
}
