//! Aggregation of raw scan results.
//!
//! Joins raw results against the active catalog to produce table rows and
//! per-severity counts. Catalog misses and unknown severities are logged
//! and dropped from the affected output, never returned as errors.

use crate::catalog::Catalog;
use crate::counters::{RiskCounters, RunCounts, SeverityCounts};
use crate::models::{AggregatedRow, EnrichedIssue, IssueDefinition, IssueType, RawResult};
use crate::severity::SeverityLevel;

/// Catalog entries for the results the catalog knows about, in input order.
fn resolved<'a>(
    raw_results: &'a [RawResult],
    catalog: &'a Catalog,
) -> impl Iterator<Item = (&'a RawResult, &'a IssueDefinition)> + 'a {
    raw_results.iter().filter_map(move |raw| {
        match catalog.lookup(raw.issue_id, raw.result_id) {
            Ok(def) => Some((raw, def)),
            Err(e) => {
                log::debug!("Dropping result from {} catalog: {}", catalog.language(), e);
                None
            }
        }
    })
}

/// Build table rows. `want_issues` selects rows whose severity is not
/// Acceptable; otherwise only Acceptable rows are kept. Input order is kept.
pub fn build_rows(
    raw_results: &[RawResult],
    catalog: &Catalog,
    want_issues: bool,
) -> Vec<AggregatedRow> {
    resolved(raw_results, catalog)
        .map(|(raw, def)| AggregatedRow::from_definition(raw, def))
        .filter(|row| (row.severity != Some(SeverityLevel::Acceptable)) == want_issues)
        .collect()
}

/// Tally results per severity. Misses and unknown codes count nowhere.
pub fn count_by_severity(raw_results: &[RawResult], catalog: &Catalog) -> SeverityCounts {
    count_where(raw_results, catalog, |_| true)
}

/// Tally only the results whose catalog entry matches `filter`.
pub fn count_where<F>(raw_results: &[RawResult], catalog: &Catalog, filter: F) -> SeverityCounts
where
    F: Fn(&IssueDefinition) -> bool,
{
    let mut counts = SeverityCounts::default();
    for (_, def) in resolved(raw_results, catalog).filter(|(_, def)| filter(def)) {
        if let Some(level) = def.level() {
            counts.record(level);
        }
    }
    counts
}

/// Overall, security and privacy counts in a single pass.
pub fn tally_run(raw_results: &[RawResult], catalog: &Catalog) -> RunCounts {
    let mut run = RunCounts::default();
    for (_, def) in resolved(raw_results, catalog) {
        let Some(level) = def.level() else {
            continue;
        };
        run.overall.record(level);
        match def.issue_type {
            IssueType::Security => run.security.record(level),
            IssueType::Privacy => run.privacy.record(level),
            IssueType::Other => {}
        }
    }
    run
}

/// Append one run's counts to every sequence of `store`.
pub fn append_run(store: &mut RiskCounters, counts: SeverityCounts) {
    store.append(counts);
}

/// Local equivalent of the backend's `GetDataBaseData` join.
pub fn enrich(raw_results: &[RawResult], catalog: &Catalog) -> Vec<EnrichedIssue> {
    resolved(raw_results, catalog)
        .map(|(raw, def)| EnrichedIssue {
            issue_id: raw.issue_id,
            result_id: raw.result_id,
            result: raw.result.clone(),
            definition: def.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use std::collections::HashSet;

    fn raw(pairs: &[(u32, u32)]) -> Vec<RawResult> {
        pairs.iter().map(|&(i, r)| RawResult::new(i, r)).collect()
    }

    #[test]
    fn test_issue_and_acceptable_tables() {
        let catalog = fixtures::catalog();
        let results = raw(&[(5, 1), (15, 0)]);

        let issues = build_rows(&results, &catalog, true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_id, 5);
        assert_eq!(issues[0].severity_label, "Low");

        let acceptable = build_rows(&results, &catalog, false);
        assert_eq!(acceptable.len(), 1);
        assert_eq!(acceptable[0].issue_id, 15);
    }

    #[test]
    fn test_catalog_misses_are_skipped() {
        let catalog = fixtures::catalog();
        let results = raw(&[(99, 0), (15, 1), (5, 7)]);
        let issues = build_rows(&results, &catalog, true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].name, "Firewall disabled");
        assert_eq!(count_by_severity(&results, &catalog).total(), 1);
    }

    #[test]
    fn test_rows_partition_resolved_input() {
        let catalog = fixtures::catalog();
        let results = raw(&[(5, 1), (5, 0), (15, 0), (15, 1), (20, 1), (21, 0), (30, 1), (404, 4)]);

        let issues = build_rows(&results, &catalog, true);
        let acceptable = build_rows(&results, &catalog, false);

        let key = |r: &AggregatedRow| (r.issue_id, r.result_id);
        let issue_keys: HashSet<_> = issues.iter().map(key).collect();
        let ok_keys: HashSet<_> = acceptable.iter().map(key).collect();
        assert!(issue_keys.is_disjoint(&ok_keys));

        let resolved_keys: HashSet<_> = results
            .iter()
            .filter(|r| catalog.get(r.issue_id, r.result_id).is_some())
            .map(|r| (r.issue_id, r.result_id))
            .collect();
        let union: HashSet<_> = issue_keys.union(&ok_keys).copied().collect();
        assert_eq!(union, resolved_keys);
    }

    #[test]
    fn test_build_rows_keeps_input_order() {
        let catalog = fixtures::catalog();
        let results = raw(&[(20, 1), (15, 1), (5, 1)]);
        let ids: Vec<u32> = build_rows(&results, &catalog, true)
            .iter()
            .map(|r| r.issue_id)
            .collect();
        assert_eq!(ids, vec![20, 15, 5]);
    }

    #[test]
    fn test_unknown_severity_rows_render_sentinel() {
        let catalog = fixtures::catalog();
        let results = raw(&[(30, 1)]);
        let issues = build_rows(&results, &catalog, true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity_label, "Unknown");
        assert_eq!(count_by_severity(&results, &catalog), SeverityCounts::default());
    }

    #[test]
    fn test_tally_run_projects_by_type() {
        let catalog = fixtures::catalog();
        let results = raw(&[(5, 1), (15, 1), (20, 1), (21, 0), (15, 0), (30, 1)]);
        let run = tally_run(&results, &catalog);

        assert_eq!(run.overall.high, 1);
        assert_eq!(run.overall.medium, 1);
        assert_eq!(run.overall.low, 1);
        assert_eq!(run.overall.info, 1);
        assert_eq!(run.overall.acceptable, 1);

        assert_eq!(run.security.total(), 3);
        assert_eq!(run.privacy.total(), 2);
        assert_eq!(run.overall, count_by_severity(&results, &catalog));
        assert_eq!(
            run.privacy,
            count_where(&results, &catalog, |d| d.issue_type == IssueType::Privacy)
        );
    }

    #[test]
    fn test_append_run_extends_store() {
        let catalog = fixtures::catalog();
        let mut store = RiskCounters::new();
        append_run(&mut store, count_by_severity(&raw(&[(15, 1)]), &catalog));
        append_run(&mut store, count_by_severity(&raw(&[(5, 1)]), &catalog));
        assert_eq!(store.all_high_risks(), &[1, 0]);
        assert_eq!(store.all_low_risks(), &[0, 1]);
    }

    #[test]
    fn test_enrich_joins_definitions() {
        let catalog = fixtures::catalog();
        let mut results = raw(&[(15, 1), (77, 0)]);
        results[0].result = Some(vec!["Public profile".into()]);
        let enriched = enrich(&results, &catalog);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].definition.name, "Firewall disabled");
        assert_eq!(enriched[0].result.as_ref().map(Vec::len), Some(1));
    }
}
