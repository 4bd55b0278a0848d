//! Table View Module
//!
//! Sortable, filterable tables over aggregated rows. Each table owns its
//! sort state and handles every header and row click through one
//! dispatcher, `TableView::handle`.

mod sort;

pub use sort::{sort_rows, SortColumn, SortDirection, SortState};

use crate::aggregate;
use crate::catalog::Catalog;
use crate::models::{AggregatedRow, RawResult};
use crate::severity::SeverityLevel;
use std::collections::BTreeSet;

/// Which partition of the results a table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Issues,
    Acceptable,
}

impl TableKind {
    pub fn wants_issues(self) -> bool {
        matches!(self, TableKind::Issues)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Empty,
    Populated,
    Filtered,
    Sorted,
}

/// User interaction on a table root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    HeaderClicked(SortColumn),
    RowClicked(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    Sorted(SortState),
    OpenIssue { issue_id: u32, result_id: u32 },
}

#[derive(Debug, Clone)]
pub struct TableView {
    kind: TableKind,
    rows: Vec<AggregatedRow>,
    state: TableState,
    sort: Option<SortState>,
    filter: Option<BTreeSet<SeverityLevel>>,
}

impl TableView {
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            state: TableState::Empty,
            sort: None,
            filter: None,
        }
    }

    /// Restore a persisted sort; it is applied on the next rebuild.
    pub fn with_sort(mut self, sort: Option<SortState>) -> Self {
        self.sort = sort;
        self
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn rows(&self) -> &[AggregatedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    pub fn active_filter(&self) -> Option<&BTreeSet<SeverityLevel>> {
        self.filter.as_ref()
    }

    pub fn fill(&mut self, rows: Vec<AggregatedRow>) {
        self.rows = rows;
        self.reapply_sort();
        self.state = TableState::Populated;
    }

    /// Fill from raw results using this table's partition.
    pub fn populate(&mut self, raw_results: &[RawResult], catalog: &Catalog) {
        self.fill(aggregate::build_rows(raw_results, catalog, self.kind.wants_issues()));
    }

    /// Rebuild from the raw results and keep rows whose level is selected.
    /// Rows with an unknown severity never match.
    pub fn apply_filter(
        &mut self,
        raw_results: &[RawResult],
        catalog: &Catalog,
        selected: &BTreeSet<SeverityLevel>,
    ) {
        self.rows = aggregate::build_rows(raw_results, catalog, self.kind.wants_issues())
            .into_iter()
            .filter(|row| row.severity.is_some_and(|level| selected.contains(&level)))
            .collect();
        self.filter = Some(selected.clone());
        self.reapply_sort();
        self.state = TableState::Filtered;
        log::debug!(
            "Filtered {:?} table to {} rows ({} levels selected)",
            self.kind,
            self.rows.len(),
            selected.len()
        );
    }

    /// Sort the current rows by `column`, flipping the shared direction.
    pub fn sort(&mut self, column: SortColumn) -> SortState {
        let direction = self
            .sort
            .map(|s| s.direction.flip())
            .unwrap_or(SortDirection::Ascending);
        let state = SortState {
            last_sorted_column: column,
            direction,
        };
        sort_rows(&mut self.rows, state);
        self.sort = Some(state);
        self.state = TableState::Sorted;
        state
    }

    pub fn handle(&mut self, event: TableEvent) -> Option<TableAction> {
        match event {
            TableEvent::HeaderClicked(column) => Some(TableAction::Sorted(self.sort(column))),
            TableEvent::RowClicked(index) => {
                let row = self.rows.get(index)?;
                Some(TableAction::OpenIssue {
                    issue_id: row.issue_id,
                    result_id: row.result_id,
                })
            }
        }
    }

    fn reapply_sort(&mut self) {
        if let Some(state) = self.sort {
            sort_rows(&mut self.rows, state);
        }
    }
}
