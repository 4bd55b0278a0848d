use crate::catalog::Language;
use crate::severity::{self, Classification, SeverityLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One check performed by the scanning backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub issue_id: u32,
    pub result_id: u32,
    #[serde(default)]
    pub result: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RawResult {
    pub fn new(issue_id: u32, result_id: u32) -> Self {
        Self {
            issue_id,
            result_id,
            result: None,
            error: None,
        }
    }
}

/// Category an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(alias = "security", alias = "SECURITY")]
    Security,
    #[serde(alias = "privacy", alias = "PRIVACY")]
    Privacy,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Security => write!(f, "Security"),
            IssueType::Privacy => write!(f, "Privacy"),
            IssueType::Other => write!(f, "Other"),
        }
    }
}

/// Catalog metadata for one `(issue_id, result_id)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssueDefinition {
    pub name: String,
    #[serde(rename = "Type")]
    pub issue_type: IssueType,
    pub severity: i64,
    #[serde(default)]
    pub information: String,
    /// One entry per remediation step
    #[serde(default)]
    pub solution: Vec<String>,
    /// Parallel to `solution`, may be shorter
    #[serde(default)]
    pub screenshots: Vec<String>,
}

impl IssueDefinition {
    pub fn classification(&self) -> Classification {
        severity::to_risk_level(self.severity)
    }

    pub fn level(&self) -> Option<SeverityLevel> {
        SeverityLevel::from_code(self.severity).ok()
    }
}

/// A table row derived from one raw result and its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    pub issue_id: u32,
    pub result_id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity_label: String,
    /// Sort weight; `None` for unknown severity codes
    pub severity_rank: Option<u8>,
    #[serde(skip)]
    pub severity: Option<SeverityLevel>,
}

impl AggregatedRow {
    pub fn from_definition(raw: &RawResult, def: &IssueDefinition) -> Self {
        let class = def.classification();
        Self {
            issue_id: raw.issue_id,
            result_id: raw.result_id,
            name: def.name.clone(),
            issue_type: def.issue_type,
            severity_label: class.label.to_string(),
            severity_rank: class.sort_weight,
            severity: class.level,
        }
    }
}

/// Raw result joined with its catalog entry, as persisted under `DataBaseData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedIssue {
    pub issue_id: u32,
    pub result_id: u32,
    #[serde(default)]
    pub result: Option<Vec<String>>,
    #[serde(flatten)]
    pub definition: IssueDefinition,
}

/// User settings as returned by `LoadUserSettings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserSettings {
    #[serde(default)]
    pub language: i64,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl UserSettings {
    /// Resolve the language, falling back to English for unknown indices.
    pub fn language(&self) -> Language {
        match Language::from_index(self.language) {
            Ok(language) => language,
            Err(e) => {
                log::warn!("{}; falling back to {}", e, Language::English);
                Language::English
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_result_parses_backend_shape() -> Result<(), serde_json::Error> {
        let json = r#"[{"issue_id":5,"result_id":1,"result":["Chrome"],"error":null},
                       {"issue_id":15,"result_id":0}]"#;
        let results: Vec<RawResult> = serde_json::from_str(json)?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].result.as_deref(), Some(&["Chrome".to_string()][..]));
        assert_eq!(results[1], RawResult::new(15, 0));
        Ok(())
    }

    #[test]
    fn test_issue_definition_parses_catalog_entry() -> Result<(), serde_json::Error> {
        let json = r#"{"Name":"Firewall disabled","Type":"Security","Severity":3,
                       "Information":"Your firewall is off.",
                       "Solution":["Open settings","Enable firewall"],
                       "Screenshots":["fw1.png"]}"#;
        let def: IssueDefinition = serde_json::from_str(json)?;
        assert_eq!(def.issue_type, IssueType::Security);
        assert_eq!(def.level(), Some(SeverityLevel::High));
        assert_eq!(def.solution.len(), 2);
        assert_eq!(def.screenshots.len(), 1);
        Ok(())
    }

    #[test]
    fn test_unrecognised_type_maps_to_other() -> Result<(), serde_json::Error> {
        let def: IssueDefinition =
            serde_json::from_str(r#"{"Name":"x","Type":"Network","Severity":1}"#)?;
        assert_eq!(def.issue_type, IssueType::Other);
        Ok(())
    }

    #[test]
    fn test_row_carries_unknown_sentinel() {
        let def = IssueDefinition {
            name: "Odd".into(),
            issue_type: IssueType::Privacy,
            severity: 9,
            information: String::new(),
            solution: vec![],
            screenshots: vec![],
        };
        let row = AggregatedRow::from_definition(&RawResult::new(1, 2), &def);
        assert_eq!(row.severity_label, severity::UNKNOWN_LABEL);
        assert_eq!(row.severity_rank, None);
    }

    #[test]
    fn test_settings_language_fallback() {
        let settings = UserSettings {
            language: 42,
            ..Default::default()
        };
        assert_eq!(settings.language(), Language::English);

        let settings: UserSettings =
            serde_json::from_str(r#"{"Language":1,"Theme":"dark","Autostart":true}"#).unwrap();
        assert_eq!(settings.language(), Language::Dutch);
        assert!(settings.extra.contains_key("Autostart"));
    }
}
