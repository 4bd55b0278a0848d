//! Issue Catalog Module
//!
//! Per-language lookup tables from `(issue_id, result_id)` to issue
//! metadata, and the providers that hand them out.
//! - `Language`: the seven supported catalog languages
//! - `Catalog`: one immutable language table
//! - `CatalogProvider`: resolves a language to its catalog

mod provider;

pub use provider::{DirCatalogProvider, StaticCatalogProvider};

use crate::errors::{ScanviewError, ScanviewResult};
use crate::models::IssueDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English = 0,
    Dutch = 1,
    German = 2,
    French = 3,
    Portuguese = 4,
    Spanish = 5,
    Estonian = 6,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::Dutch,
        Language::German,
        Language::French,
        Language::Portuguese,
        Language::Spanish,
        Language::Estonian,
    ];

    pub fn from_index(index: i64) -> ScanviewResult<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ScanviewError::UnknownLanguage(index))
    }

    pub fn index(self) -> i64 {
        self as i64
    }

    /// Two-letter code used for catalog and locale file names.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Dutch => "nl",
            Language::German => "de",
            Language::French => "fr",
            Language::Portuguese => "pt",
            Language::Spanish => "es",
            Language::Estonian => "et",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.code() == code)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::English => "English",
            Language::Dutch => "Dutch",
            Language::German => "German",
            Language::French => "French",
            Language::Portuguese => "Portuguese",
            Language::Spanish => "Spanish",
            Language::Estonian => "Estonian",
        };
        f.write_str(name)
    }
}

/// Immutable issue table for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    language: Language,
    entries: HashMap<u32, HashMap<u32, IssueDefinition>>,
}

impl Catalog {
    pub fn new(language: Language, entries: HashMap<u32, HashMap<u32, IssueDefinition>>) -> Self {
        Self { language, entries }
    }

    /// Parse the `{ "<issue_id>": { "<result_id>": {..} } }` catalog layout.
    /// Malformed ids or entries are dropped one by one.
    pub fn from_json_str(language: Language, json: &str) -> ScanviewResult<Self> {
        let raw: HashMap<String, HashMap<String, serde_json::Value>> = serde_json::from_str(json)?;
        let mut entries: HashMap<u32, HashMap<u32, IssueDefinition>> = HashMap::new();
        for (issue_key, results) in raw {
            let Ok(issue_id) = issue_key.parse::<u32>() else {
                log::debug!("Skipping {} catalog issue with bad id '{}'", language, issue_key);
                continue;
            };
            for (result_key, value) in results {
                let Ok(result_id) = result_key.parse::<u32>() else {
                    log::debug!(
                        "Skipping {} catalog result {}/'{}'",
                        language,
                        issue_id,
                        result_key
                    );
                    continue;
                };
                match serde_json::from_value::<IssueDefinition>(value) {
                    Ok(definition) => {
                        entries.entry(issue_id).or_default().insert(result_id, definition);
                    }
                    Err(e) => log::debug!(
                        "Skipping {} catalog entry {}/{}: {}",
                        language,
                        issue_id,
                        result_id,
                        e
                    ),
                }
            }
        }
        Ok(Self::new(language, entries))
    }

    pub fn from_file(language: Language, path: &Path) -> ScanviewResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScanviewError::io(e, path.to_path_buf()))?;
        Self::from_json_str(language, &json)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn get(&self, issue_id: u32, result_id: u32) -> Option<&IssueDefinition> {
        self.entries.get(&issue_id)?.get(&result_id)
    }

    /// Like `get`, but reports a miss as `CatalogMiss`.
    pub fn lookup(&self, issue_id: u32, result_id: u32) -> ScanviewResult<&IssueDefinition> {
        self.get(issue_id, result_id)
            .ok_or(ScanviewError::CatalogMiss { issue_id, result_id })
    }

    /// Number of `(issue_id, result_id)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves a language to its loaded catalog.
pub trait CatalogProvider: Send + Sync {
    fn get(&self, language: Language) -> ScanviewResult<Arc<Catalog>>;
}
