//! Localized strings for static labels (table headers, legends).

use crate::catalog::Language;
use crate::errors::{ScanviewError, ScanviewResult};
use crate::severity::SeverityLevel;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

/// Resolves a message id to a display string for the active language.
pub trait Localizer: Send + Sync {
    fn localize(&self, message_id: &str) -> impl Future<Output = String> + Send;
}

/// Flat `{ "message-id": "text" }` table for one language.
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    language: Option<Language>,
    messages: HashMap<String, String>,
}

impl MessageTable {
    pub fn new(language: Language, messages: HashMap<String, String>) -> Self {
        Self {
            language: Some(language),
            messages,
        }
    }

    /// Load `<dir>/<code>.json`; a missing file yields an empty table.
    pub fn load(dir: &Path, language: Language) -> ScanviewResult<Self> {
        let path = dir.join(format!("{}.json", language.code()));
        let messages = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No {} message table at {:?}", language, path);
                HashMap::new()
            }
            Err(e) => return Err(ScanviewError::io(e, path)),
        };
        Ok(Self::new(language, messages))
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    /// The message text, or the id itself when missing.
    pub fn lookup(&self, message_id: &str) -> String {
        match self.messages.get(message_id) {
            Some(text) => text.clone(),
            None => {
                log::debug!("No translation for '{}'", message_id);
                message_id.to_string()
            }
        }
    }
}

impl Localizer for MessageTable {
    async fn localize(&self, message_id: &str) -> String {
        self.lookup(message_id)
    }
}

/// Header and legend text resolved once per render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeaders {
    pub name: String,
    pub issue_type: String,
    pub risk: String,
    pub issues_title: String,
    pub acceptable_title: String,
    /// Severity names in `SeverityLevel::ALL` order
    pub severities: [String; 5],
}

impl TableHeaders {
    pub async fn resolve<L: Localizer>(localizer: &L) -> Self {
        let mut severities: [String; 5] = Default::default();
        for (slot, level) in severities.iter_mut().zip(SeverityLevel::ALL) {
            *slot = localizer.localize(level.message_id()).await;
        }
        Self {
            name: localizer.localize("table-name").await,
            issue_type: localizer.localize("table-type").await,
            risk: localizer.localize("table-risk").await,
            issues_title: localizer.localize("issues-title").await,
            acceptable_title: localizer.localize("acceptable-title").await,
            severities,
        }
    }

    pub fn severity_name(&self, level: SeverityLevel) -> &str {
        let index = SeverityLevel::ALL
            .iter()
            .position(|&l| l == level)
            .unwrap_or_default();
        &self.severities[index]
    }
}

impl Default for TableHeaders {
    fn default() -> Self {
        Self {
            name: "Name".into(),
            issue_type: "Type".into(),
            risk: "Risk".into(),
            issues_title: "Issues".into(),
            acceptable_title: "Acceptable".into(),
            severities: SeverityLevel::ALL.map(|l| l.label().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_headers_resolve_with_fallback() {
        let messages = HashMap::from([
            ("table-name".to_string(), "Naam".to_string()),
            ("risk-high".to_string(), "Hoog".to_string()),
        ]);
        let table = MessageTable::new(Language::Dutch, messages);
        let headers = TableHeaders::resolve(&table).await;
        assert_eq!(headers.name, "Naam");
        assert_eq!(headers.risk, "table-risk");
        assert_eq!(headers.severities[0], "Hoog");
        assert_eq!(headers.severities[4], "risk-acceptable");
    }

    #[test]
    fn test_load_from_dir() -> ScanviewResult<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("de.json"), r#"{"table-type":"Typ"}"#)?;

        let german = MessageTable::load(dir.path(), Language::German)?;
        assert_eq!(german.lookup("table-type"), "Typ");

        let french = MessageTable::load(dir.path(), Language::French)?;
        assert_eq!(french.lookup("table-type"), "table-type");
        Ok(())
    }
}
