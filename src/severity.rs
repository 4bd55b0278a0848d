//! Severity classification.
//!
//! Maps the raw numeric severity code from the issue catalog onto one of
//! five risk levels, a display label and a sort weight.

use crate::errors::{ScanviewError, ScanviewResult};
use serde::{Deserialize, Serialize};

/// Label rendered for severity codes outside 0..=4.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLevel {
    Acceptable = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Info = 4,
}

impl SeverityLevel {
    /// Display order used by counters and charts.
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::High,
        SeverityLevel::Medium,
        SeverityLevel::Low,
        SeverityLevel::Info,
        SeverityLevel::Acceptable,
    ];

    pub fn from_code(code: i64) -> ScanviewResult<Self> {
        match code {
            0 => Ok(SeverityLevel::Acceptable),
            1 => Ok(SeverityLevel::Low),
            2 => Ok(SeverityLevel::Medium),
            3 => Ok(SeverityLevel::High),
            4 => Ok(SeverityLevel::Info),
            other => Err(ScanviewError::UnknownSeverity(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::Acceptable => "Acceptable",
            SeverityLevel::Low => "Low",
            SeverityLevel::Medium => "Medium",
            SeverityLevel::High => "High",
            SeverityLevel::Info => "Info",
        }
    }

    /// Info shares Acceptable's weight.
    pub fn sort_weight(self) -> u8 {
        match self {
            SeverityLevel::Acceptable | SeverityLevel::Info => 0,
            SeverityLevel::Low => 1,
            SeverityLevel::Medium => 2,
            SeverityLevel::High => 3,
        }
    }

    /// Whether the level counts as a risk. Info and Acceptable do not.
    pub fn is_concern(self) -> bool {
        matches!(
            self,
            SeverityLevel::Low | SeverityLevel::Medium | SeverityLevel::High
        )
    }

    /// Localization key for the level's display name.
    pub fn message_id(self) -> &'static str {
        match self {
            SeverityLevel::Acceptable => "risk-acceptable",
            SeverityLevel::Low => "risk-low",
            SeverityLevel::Medium => "risk-medium",
            SeverityLevel::High => "risk-high",
            SeverityLevel::Info => "risk-info",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            SeverityLevel::Acceptable => "risk-none",
            SeverityLevel::Low => "risk-low",
            SeverityLevel::Medium => "risk-medium",
            SeverityLevel::High => "risk-high",
            SeverityLevel::Info => "risk-info",
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acceptable" | "none" | "no-risk" | "0" => Ok(SeverityLevel::Acceptable),
            "low" | "1" => Ok(SeverityLevel::Low),
            "medium" | "2" => Ok(SeverityLevel::Medium),
            "high" | "3" => Ok(SeverityLevel::High),
            "info" | "4" => Ok(SeverityLevel::Info),
            other => Err(format!("unknown severity level '{}'", other)),
        }
    }
}

/// Result of classifying a raw severity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: Option<SeverityLevel>,
    pub label: &'static str,
    pub sort_weight: Option<u8>,
}

/// Classify a severity code, failing on codes outside 0..=4.
pub fn classify(code: i64) -> ScanviewResult<Classification> {
    let level = SeverityLevel::from_code(code)?;
    Ok(Classification {
        level: Some(level),
        label: level.label(),
        sort_weight: Some(level.sort_weight()),
    })
}

/// Classify a severity code, rendering unknown codes as the sentinel.
pub fn to_risk_level(code: i64) -> Classification {
    classify(code).unwrap_or_else(|e| {
        log::debug!("{}", e);
        Classification {
            level: None,
            label: UNKNOWN_LABEL,
            sort_weight: None,
        }
    })
}
