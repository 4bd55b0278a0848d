//! Guided remediation pages for a single issue.

use crate::catalog::Catalog;
use crate::models::IssueDefinition;
use crate::severity::{self, Classification};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationStep {
    /// 1-based step number
    pub number: usize,
    pub text: String,
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationGuide {
    pub issue_id: u32,
    pub result_id: u32,
    pub name: String,
    pub risk_label: &'static str,
    pub information: String,
    pub steps: Vec<RemediationStep>,
}

impl RemediationGuide {
    pub fn from_definition(issue_id: u32, result_id: u32, def: &IssueDefinition) -> Self {
        let Classification { label, .. } = severity::to_risk_level(def.severity);
        let steps = def
            .solution
            .iter()
            .enumerate()
            .map(|(i, text)| RemediationStep {
                number: i + 1,
                text: text.clone(),
                screenshot: def.screenshots.get(i).cloned(),
            })
            .collect();
        Self {
            issue_id,
            result_id,
            name: def.name.clone(),
            risk_label: label,
            information: def.information.clone(),
            steps,
        }
    }

    pub fn lookup(catalog: &Catalog, issue_id: u32, result_id: u32) -> Option<Self> {
        match catalog.lookup(issue_id, result_id) {
            Ok(def) => Some(Self::from_definition(issue_id, result_id, def)),
            Err(e) => {
                log::debug!("No remediation guide: {}", e);
                None
            }
        }
    }
}
