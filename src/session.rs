//! Session-scoped key/value state.
//!
//! Values are stored as JSON strings under fixed keys and optionally
//! flushed to a single file so the state survives between page views.

use crate::counters::{RiskCounterSet, RiskCounters};
use crate::errors::{ScanviewError, ScanviewResult};
use crate::models::{EnrichedIssue, RawResult};
use crate::table::SortState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SCAN_RESULT: &str = "ScanResult";
pub const RISK_COUNTERS: &str = "RiskCounters";
pub const SECURITY_RISK_COUNTERS: &str = "SecurityRiskCounters";
pub const PRIVACY_RISK_COUNTERS: &str = "PrivacyRiskCounters";
pub const DATABASE_DATA: &str = "DataBaseData";
pub const ISSUES_SORTED: &str = "IssuesSorted";

#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    values: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// In-memory store that is never flushed.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, starting empty when the file is missing.
    pub fn open(path: impl AsRef<Path>) -> ScanviewResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ScanviewError::io(e, path)),
        };
        log::debug!("Opened session {:?} with {} keys", path, values.len());
        Ok(Self {
            values,
            path: Some(path),
        })
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> ScanviewResult<Option<T>> {
        match self.values.get(key) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| ScanviewError::session(key, e.to_string())),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> ScanviewResult<()> {
        self.values.insert(key.to_string(), serde_json::to_string(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn flush(&self) -> ScanviewResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, json).map_err(|e| ScanviewError::io(e, path.clone()))
    }

    pub fn scan_result(&self) -> ScanviewResult<Option<Vec<RawResult>>> {
        self.get(SCAN_RESULT)
    }

    pub fn database_data(&self) -> ScanviewResult<Option<Vec<EnrichedIssue>>> {
        self.get(DATABASE_DATA)
    }

    pub fn issues_sorted(&self) -> Option<SortState> {
        self.get(ISSUES_SORTED).unwrap_or_else(|e| {
            log::warn!("Discarding persisted sort: {}", e);
            None
        })
    }

    /// Restore the three counter histories. A corrupt record resets all
    /// three, keeping them run-aligned.
    pub fn counters(&self) -> RiskCounterSet {
        let restored = (|| -> ScanviewResult<RiskCounterSet> {
            Ok(RiskCounterSet {
                overall: self.get::<RiskCounters>(RISK_COUNTERS)?.unwrap_or_default(),
                security: self.get::<RiskCounters>(SECURITY_RISK_COUNTERS)?.unwrap_or_default(),
                privacy: self.get::<RiskCounters>(PRIVACY_RISK_COUNTERS)?.unwrap_or_default(),
            })
        })();
        match restored {
            Ok(set) if set.security.len() == set.runs() && set.privacy.len() == set.runs() => set,
            Ok(_) => {
                log::warn!("Persisted counter histories disagree on run count; starting fresh");
                RiskCounterSet::new()
            }
            Err(e) => {
                log::warn!("Discarding persisted counters: {}", e);
                RiskCounterSet::new()
            }
        }
    }

    pub fn set_counters(&mut self, set: &RiskCounterSet) -> ScanviewResult<()> {
        self.set(RISK_COUNTERS, &set.overall)?;
        self.set(SECURITY_RISK_COUNTERS, &set.security)?;
        self.set(PRIVACY_RISK_COUNTERS, &set.privacy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::{RunCounts, SeverityCounts};
    use crate::table::{SortColumn, SortDirection};
    use tempfile::TempDir;

    #[test]
    fn test_values_round_trip_through_file() -> ScanviewResult<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("session.json");

        let mut set = RiskCounterSet::new();
        set.append(RunCounts {
            overall: SeverityCounts { high: 2, ..Default::default() },
            security: SeverityCounts { high: 2, ..Default::default() },
            privacy: SeverityCounts::default(),
        });
        let results = vec![RawResult::new(5, 1), RawResult::new(15, 0)];
        let sort = SortState {
            last_sorted_column: SortColumn::Type,
            direction: SortDirection::Descending,
        };

        let mut session = SessionStore::open(&path)?;
        session.set(SCAN_RESULT, &results)?;
        session.set(ISSUES_SORTED, &sort)?;
        session.set_counters(&set)?;
        session.flush()?;

        let reopened = SessionStore::open(&path)?;
        assert_eq!(reopened.scan_result()?, Some(results));
        assert_eq!(reopened.issues_sorted(), Some(sort));
        assert_eq!(reopened.counters(), set);
        assert_eq!(
            reopened.get_raw(ISSUES_SORTED),
            Some(r#"{"column":"1","direction":"descending"}"#)
        );
        Ok(())
    }

    #[test]
    fn test_issue_data_round_trips_through_file() -> ScanviewResult<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("session.json");

        let mut with_output = RawResult::new(15, 1);
        with_output.result = Some(vec!["Public profile".to_string(), "Domain profile".to_string()]);
        let raw = vec![with_output, RawResult::new(5, 0), RawResult::new(30, 1)];
        let enriched = crate::aggregate::enrich(&raw, &crate::catalog::fixtures::catalog());
        assert_eq!(enriched.len(), 3);

        let mut session = SessionStore::open(&path)?;
        session.set(DATABASE_DATA, &enriched)?;
        session.flush()?;

        let reopened = SessionStore::open(&path)?;
        assert_eq!(reopened.database_data()?, Some(enriched));
        let stored = reopened.get_raw(DATABASE_DATA).unwrap_or_default();
        assert!(stored.contains(r#""Name":"Firewall disabled""#));
        assert!(stored.contains(r#""issue_id":15"#));
        Ok(())
    }

    #[test]
    fn test_missing_keys_are_empty() -> ScanviewResult<()> {
        let session = SessionStore::in_memory();
        assert_eq!(session.scan_result()?, None);
        assert!(session.database_data()?.is_none());
        assert_eq!(session.counters().runs(), 0);
        assert!(session.flush().is_ok());
        Ok(())
    }

    #[test]
    fn test_corrupt_counters_reset_all() -> ScanviewResult<()> {
        let mut session = SessionStore::in_memory();
        session.set(RISK_COUNTERS, &RiskCounters::seeded(SeverityCounts::default()))?;
        session.values.insert(
            SECURITY_RISK_COUNTERS.to_string(),
            r#"{"allHighRisks":[1],"allMediumRisks":[],"allLowRisks":[],"allInfoRisks":[],"allNoRisks":[]}"#
                .to_string(),
        );
        assert_eq!(session.counters(), RiskCounterSet::new());
        Ok(())
    }

    #[test]
    fn test_unaligned_histories_reset() -> ScanviewResult<()> {
        let mut session = SessionStore::in_memory();
        session.set(RISK_COUNTERS, &RiskCounters::seeded(SeverityCounts::default()))?;
        assert_eq!(session.counters().runs(), 0);
        Ok(())
    }

    #[test]
    fn test_bad_sort_record_is_ignored() {
        let mut session = SessionStore::in_memory();
        session
            .values
            .insert(ISSUES_SORTED.to_string(), r#"{"column":"x","direction":"up"}"#.to_string());
        assert_eq!(session.issues_sorted(), None);
    }
}
