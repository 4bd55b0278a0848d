//! Column sorting for table views.

use crate::errors::{ScanviewError, ScanviewResult};
use crate::models::AggregatedRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name = 0,
    Type = 1,
    Risk = 2,
}

impl SortColumn {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SortColumn::Name),
            1 => Some(SortColumn::Type),
            2 => Some(SortColumn::Risk),
            _ => None,
        }
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "0" => Ok(SortColumn::Name),
            "type" | "1" => Ok(SortColumn::Type),
            "risk" | "2" => Ok(SortColumn::Risk),
            other => Err(format!("unknown sort column '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Last requested sort of a table, persisted as `IssuesSorted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PersistedSort", try_from = "PersistedSort")]
pub struct SortState {
    pub last_sorted_column: SortColumn,
    pub direction: SortDirection,
}

/// `{ "column": "<index>", "direction": "ascending" | "descending" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSort {
    column: String,
    direction: SortDirection,
}

impl From<SortState> for PersistedSort {
    fn from(state: SortState) -> Self {
        Self {
            column: state.last_sorted_column.index().to_string(),
            direction: state.direction,
        }
    }
}

impl TryFrom<PersistedSort> for SortState {
    type Error = ScanviewError;

    fn try_from(record: PersistedSort) -> ScanviewResult<Self> {
        let column = record
            .column
            .parse::<usize>()
            .ok()
            .and_then(SortColumn::from_index)
            .ok_or_else(|| {
                ScanviewError::session("IssuesSorted", format!("bad column '{}'", record.column))
            })?;
        Ok(Self {
            last_sorted_column: column,
            direction: record.direction,
        })
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Stable sort of `rows` by `state`. Rows with an unknown severity stay
/// after every ranked row when sorting by risk, in either direction.
pub fn sort_rows(rows: &mut [AggregatedRow], state: SortState) {
    let direction = state.direction;
    match state.last_sorted_column {
        SortColumn::Name => rows.sort_by(|a, b| direction.apply(compare_text(&a.name, &b.name))),
        SortColumn::Type => rows.sort_by(|a, b| {
            direction.apply(compare_text(&a.issue_type.to_string(), &b.issue_type.to_string()))
        }),
        SortColumn::Risk => rows.sort_by(|a, b| match (a.severity_rank, b.severity_rank) {
            (Some(x), Some(y)) => direction.apply(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
}
