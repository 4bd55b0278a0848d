//! Risk counter history.
//!
//! `RiskCounters` keeps one count per severity level per scan run, in five
//! index-aligned sequences. The sequences only grow together through
//! `append`, and deserialization rejects records whose lengths differ.

use crate::errors::{ScanviewError, ScanviewResult};
use crate::severity::SeverityLevel;
use serde::{Deserialize, Serialize};

/// Per-severity tally for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub info: u32,
    pub acceptable: u32,
}

impl SeverityCounts {
    pub fn get(&self, level: SeverityLevel) -> u32 {
        match level {
            SeverityLevel::High => self.high,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::Low => self.low,
            SeverityLevel::Info => self.info,
            SeverityLevel::Acceptable => self.acceptable,
        }
    }

    pub fn record(&mut self, level: SeverityLevel) {
        match level {
            SeverityLevel::High => self.high += 1,
            SeverityLevel::Medium => self.medium += 1,
            SeverityLevel::Low => self.low += 1,
            SeverityLevel::Info => self.info += 1,
            SeverityLevel::Acceptable => self.acceptable += 1,
        }
    }

    /// High + Medium + Low
    pub fn concerns(&self) -> u32 {
        self.high + self.medium + self.low
    }

    pub fn total(&self) -> u32 {
        self.concerns() + self.info + self.acceptable
    }
}

/// Serialized layout, validated on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterRecord {
    all_high_risks: Vec<u32>,
    all_medium_risks: Vec<u32>,
    all_low_risks: Vec<u32>,
    all_info_risks: Vec<u32>,
    all_no_risks: Vec<u32>,
}

impl TryFrom<CounterRecord> for RiskCounters {
    type Error = ScanviewError;

    fn try_from(record: CounterRecord) -> ScanviewResult<Self> {
        let len = record.all_high_risks.len();
        let aligned = [
            record.all_medium_risks.len(),
            record.all_low_risks.len(),
            record.all_info_risks.len(),
            record.all_no_risks.len(),
        ]
        .iter()
        .all(|&l| l == len);
        if !aligned {
            return Err(ScanviewError::session(
                "RiskCounters",
                "severity sequences have different lengths",
            ));
        }
        Ok(Self {
            all_high_risks: record.all_high_risks,
            all_medium_risks: record.all_medium_risks,
            all_low_risks: record.all_low_risks,
            all_info_risks: record.all_info_risks,
            all_no_risks: record.all_no_risks,
        })
    }
}

/// Accumulating per-run counts for the five severity levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CounterRecord")]
pub struct RiskCounters {
    all_high_risks: Vec<u32>,
    all_medium_risks: Vec<u32>,
    all_low_risks: Vec<u32>,
    all_info_risks: Vec<u32>,
    all_no_risks: Vec<u32>,
}

impl RiskCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding a single run.
    pub fn seeded(counts: SeverityCounts) -> Self {
        let mut counters = Self::new();
        counters.append(counts);
        counters
    }

    pub fn append(&mut self, counts: SeverityCounts) {
        self.all_high_risks.push(counts.high);
        self.all_medium_risks.push(counts.medium);
        self.all_low_risks.push(counts.low);
        self.all_info_risks.push(counts.info);
        self.all_no_risks.push(counts.acceptable);
        debug_assert!(self.is_aligned());
    }

    /// Number of runs recorded.
    pub fn len(&self) -> usize {
        self.all_high_risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn series(&self, level: SeverityLevel) -> &[u32] {
        match level {
            SeverityLevel::High => &self.all_high_risks,
            SeverityLevel::Medium => &self.all_medium_risks,
            SeverityLevel::Low => &self.all_low_risks,
            SeverityLevel::Info => &self.all_info_risks,
            SeverityLevel::Acceptable => &self.all_no_risks,
        }
    }

    pub fn all_high_risks(&self) -> &[u32] {
        &self.all_high_risks
    }

    pub fn all_medium_risks(&self) -> &[u32] {
        &self.all_medium_risks
    }

    pub fn all_low_risks(&self) -> &[u32] {
        &self.all_low_risks
    }

    pub fn all_info_risks(&self) -> &[u32] {
        &self.all_info_risks
    }

    pub fn all_no_risks(&self) -> &[u32] {
        &self.all_no_risks
    }

    /// Most recent count for `level`, zero before the first run.
    pub fn last(&self, level: SeverityLevel) -> u32 {
        self.series(level).last().copied().unwrap_or(0)
    }

    pub fn last_high_risks(&self) -> u32 {
        self.last(SeverityLevel::High)
    }

    pub fn last_medium_risks(&self) -> u32 {
        self.last(SeverityLevel::Medium)
    }

    pub fn last_low_risks(&self) -> u32 {
        self.last(SeverityLevel::Low)
    }

    pub fn last_info_risks(&self) -> u32 {
        self.last(SeverityLevel::Info)
    }

    pub fn last_no_risks(&self) -> u32 {
        self.last(SeverityLevel::Acceptable)
    }

    /// Counts of the most recent run, or all zeros when empty.
    pub fn latest(&self) -> SeverityCounts {
        SeverityCounts {
            high: self.last_high_risks(),
            medium: self.last_medium_risks(),
            low: self.last_low_risks(),
            info: self.last_info_risks(),
            acceptable: self.last_no_risks(),
        }
    }

    /// The last `min(n, len)` runs, most recent last.
    pub fn window(&self, n: usize) -> ScanviewResult<CounterWindow<'_>> {
        if n < 1 {
            return Err(ScanviewError::InvalidWindowSize(n));
        }
        let start = self.len().saturating_sub(n);
        Ok(CounterWindow {
            high: &self.all_high_risks[start..],
            medium: &self.all_medium_risks[start..],
            low: &self.all_low_risks[start..],
            info: &self.all_info_risks[start..],
            acceptable: &self.all_no_risks[start..],
        })
    }

    fn is_aligned(&self) -> bool {
        let len = self.len();
        self.all_medium_risks.len() == len
            && self.all_low_risks.len() == len
            && self.all_info_risks.len() == len
            && self.all_no_risks.len() == len
    }
}

/// Right-aligned slice of the five sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterWindow<'a> {
    pub high: &'a [u32],
    pub medium: &'a [u32],
    pub low: &'a [u32],
    pub info: &'a [u32],
    pub acceptable: &'a [u32],
}

impl<'a> CounterWindow<'a> {
    pub fn series(&self, level: SeverityLevel) -> &'a [u32] {
        match level {
            SeverityLevel::High => self.high,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::Low => self.low,
            SeverityLevel::Info => self.info,
            SeverityLevel::Acceptable => self.acceptable,
        }
    }

    pub fn len(&self) -> usize {
        self.high.len()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty()
    }
}

/// Counts for one run across the three projections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub overall: SeverityCounts,
    pub security: SeverityCounts,
    pub privacy: SeverityCounts,
}

/// The overall, security-only and privacy-only histories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskCounterSet {
    pub overall: RiskCounters,
    pub security: RiskCounters,
    pub privacy: RiskCounters,
}

impl RiskCounterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, run: RunCounts) {
        self.overall.append(run.overall);
        self.security.append(run.security);
        self.privacy.append(run.privacy);
    }

    pub fn runs(&self) -> usize {
        self.overall.len()
    }
}
