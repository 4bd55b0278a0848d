//! Chart View Module
//!
//! Read-only chart data built from a `RiskCounters` history:
//! - `PieChart`: latest run, one slice per severity
//! - `BarChart`: stacked history over a rolling window, with per-severity
//!   visibility toggles

mod theme;

pub use theme::Theme;

use crate::counters::RiskCounters;
use crate::errors::{ScanviewError, ScanviewResult};
use crate::severity::SeverityLevel;
use serde::Serialize;

pub const DEFAULT_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieData {
    pub labels: Vec<String>,
    pub values: Vec<u32>,
    pub colors: Vec<&'static str>,
}

impl PieData {
    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

pub struct PieChart<'a> {
    counters: &'a RiskCounters,
    theme: Theme,
}

impl<'a> PieChart<'a> {
    pub fn new(counters: &'a RiskCounters, theme: Theme) -> Self {
        Self { counters, theme }
    }

    /// `labels` overrides the severity names, in `SeverityLevel::ALL` order.
    pub fn data_with_labels(&self, labels: Option<&[String; 5]>) -> PieData {
        let latest = self.counters.latest();
        PieData {
            labels: SeverityLevel::ALL
                .iter()
                .enumerate()
                .map(|(i, level)| match labels {
                    Some(names) => names[i].clone(),
                    None => level.label().to_string(),
                })
                .collect(),
            values: SeverityLevel::ALL.iter().map(|&l| latest.get(l)).collect(),
            colors: SeverityLevel::ALL.iter().map(|&l| self.theme.color(l)).collect(),
        }
    }

    pub fn data(&self) -> PieData {
        self.data_with_labels(None)
    }
}

/// Which severity series the bar chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityVisibility {
    pub high: bool,
    pub medium: bool,
    pub low: bool,
    pub info: bool,
    pub acceptable: bool,
}

impl Default for SeverityVisibility {
    fn default() -> Self {
        Self {
            high: true,
            medium: true,
            low: true,
            info: true,
            acceptable: true,
        }
    }
}

impl SeverityVisibility {
    pub fn is_visible(&self, level: SeverityLevel) -> bool {
        match level {
            SeverityLevel::High => self.high,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::Low => self.low,
            SeverityLevel::Info => self.info,
            SeverityLevel::Acceptable => self.acceptable,
        }
    }

    // TODO: confirm with product whether hiding "no risk" should also hide
    // "info"; the toggles are independent until then.
    pub fn toggle(&mut self, level: SeverityLevel) {
        let flag = match level {
            SeverityLevel::High => &mut self.high,
            SeverityLevel::Medium => &mut self.medium,
            SeverityLevel::Low => &mut self.low,
            SeverityLevel::Info => &mut self.info,
            SeverityLevel::Acceptable => &mut self.acceptable,
        };
        *flag = !*flag;
    }

    pub fn hidden(levels: &[SeverityLevel]) -> Self {
        let mut visibility = Self::default();
        for &level in levels {
            if visibility.is_visible(level) {
                visibility.toggle(level);
            }
        }
        visibility
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDataset {
    pub label: String,
    #[serde(skip)]
    pub level: Option<SeverityLevel>,
    pub data: Vec<u32>,
    pub background_color: &'static str,
    pub stack: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarData {
    pub labels: Vec<String>,
    pub datasets: Vec<BarDataset>,
}

/// Stacked bar chart state: window size, visibility and theme.
#[derive(Debug, Clone)]
pub struct BarChart {
    window_size: usize,
    visibility: SeverityVisibility,
    theme: Theme,
}

impl BarChart {
    pub fn new(theme: Theme) -> Self {
        Self {
            window_size: DEFAULT_WINDOW,
            visibility: SeverityVisibility::default(),
            theme,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn visibility(&self) -> SeverityVisibility {
        self.visibility
    }

    /// Change the window; an invalid size keeps the previous one.
    pub fn set_window(&mut self, size: usize) -> ScanviewResult<()> {
        if size < 1 {
            log::warn!("Ignoring bar chart window of {}", size);
            return Err(ScanviewError::InvalidWindowSize(size));
        }
        self.window_size = size;
        Ok(())
    }

    pub fn set_visibility(&mut self, visibility: SeverityVisibility) {
        self.visibility = visibility;
    }

    pub fn toggle(&mut self, level: SeverityLevel) {
        self.visibility.toggle(level);
    }

    /// Recompute the whole chart from `counters`.
    pub fn data(&self, counters: &RiskCounters) -> ScanviewResult<BarData> {
        self.data_with_labels(counters, None)
    }

    pub fn data_with_labels(
        &self,
        counters: &RiskCounters,
        labels: Option<&[String; 5]>,
    ) -> ScanviewResult<BarData> {
        let window = counters.window(self.window_size)?;
        let datasets = SeverityLevel::ALL
            .iter()
            .enumerate()
            .filter(|(_, level)| self.visibility.is_visible(**level))
            .map(|(i, &level)| BarDataset {
                label: labels
                    .map(|names| names[i].clone())
                    .unwrap_or_else(|| level.label().to_string()),
                level: Some(level),
                data: window.series(level).to_vec(),
                background_color: self.theme.color(level),
                stack: "risks",
            })
            .collect();

        Ok(BarData {
            labels: (1..=window.len()).map(|i| i.to_string()).collect(),
            datasets,
        })
    }
}
