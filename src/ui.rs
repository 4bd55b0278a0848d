use crate::counters::RiskCounters;
use crate::dashboard::ScanOutcome;
use crate::localize::TableHeaders;
use crate::models::AggregatedRow;
use crate::remediation::RemediationGuide;
use crate::severity::SeverityLevel;
use crate::table::TableView;
use console::{pad_str, style, Alignment, StyledObject, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const NAME_WIDTH: usize = 40;
const TYPE_WIDTH: usize = 10;
const RISK_WIDTH: usize = 12;

pub struct TerminalUI {
    term: Term,
    quiet: bool,
}

impl TerminalUI {
    pub fn new(quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            quiet,
        }
    }

    /// Show a spinner until `scan` resolves.
    pub async fn while_scanning<F: Future>(&self, scan: F) -> F::Output {
        let spinner = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        let template = "{prefix} {spinner:.cyan} {msg} [{elapsed}]";
        if let Ok(spinner_style) = ProgressStyle::with_template(template) {
            spinner.set_style(spinner_style.tick_strings(&["▰▱▱", "▰▰▱", "▰▰▰", "▱▰▰", "▱▱▰", "▱▱▱"]));
        }
        spinner.set_prefix(style("🔍 SCAN").green().bold().to_string());
        spinner.set_message("Waiting for host results...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let output = scan.await;
        spinner.finish_and_clear();
        output
    }

    pub fn print_outcome(&self, outcome: &ScanOutcome) {
        if self.quiet {
            return;
        }
        match outcome {
            ScanOutcome::Completed(summary) => {
                println!(
                    "    {} Run {} complete: {} results, {} concerns ({:.1}s)",
                    style("▶").green(),
                    style(summary.run).white().bold(),
                    summary.results,
                    style(summary.counts.concerns()).red().bold(),
                    (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0
                );
            }
            ScanOutcome::Ignored => {
                println!("    {} Scan already running, trigger ignored", style("…").yellow());
            }
            ScanOutcome::Failed(e) => {
                println!(
                    "    {} Scan failed, dashboard unchanged: {}",
                    style("✖").red(),
                    style(e).dim()
                );
            }
        }
    }

    pub fn print_table(&self, title: &str, table: &TableView, headers: &TableHeaders) {
        if self.quiet {
            return;
        }
        println!();
        println!("  {} {}", style(title).cyan().bold(), style(format!("({})", table.len())).dim());
        let mut lines = render_table(table.rows(), headers).into_iter();
        if let Some(header) = lines.next() {
            println!("  {}", style(header).bold());
        }
        for (line, row) in lines.zip(table.rows()) {
            println!("  {}", level_style(row.severity, line));
        }
    }

    pub fn print_summary(&self, counters: &RiskCounters, headers: &TableHeaders) {
        if self.quiet {
            return;
        }
        let latest = counters.latest();
        println!();
        println!("{}", style("╔══════════════════════════════════════════════╗").cyan());
        println!("{}", style("║                 RISK SUMMARY                 ║").cyan().bold());
        println!("{}", style("╚══════════════════════════════════════════════╝").cyan());
        for (name, level) in headers.severities.iter().zip(SeverityLevel::ALL) {
            println!(
                "   {} {}",
                level_style(
                    Some(level),
                    pad_str(name, RISK_WIDTH, Alignment::Left, None).into_owned()
                ),
                style(latest.get(level)).white().bold()
            );
        }
        println!("   {} runs recorded", style(counters.len()).dim());
        let _ = self.term.flush();
    }

    pub fn print_remediation(&self, guide: &RemediationGuide) {
        if self.quiet {
            return;
        }
        println!();
        println!("  {} [{}]", style(&guide.name).bold(), guide.risk_label);
        if !guide.information.is_empty() {
            println!("  {}", style(&guide.information).dim());
        }
        for step in &guide.steps {
            println!("   {}. {}", step.number, step.text);
            if let Some(shot) = &step.screenshot {
                println!("      {}", style(shot).dim().italic());
            }
        }
    }
}

fn level_style(level: Option<SeverityLevel>, text: String) -> StyledObject<String> {
    match level {
        Some(SeverityLevel::High) => style(text).red(),
        Some(SeverityLevel::Medium) => style(text).color256(208),
        Some(SeverityLevel::Low) => style(text).yellow(),
        Some(SeverityLevel::Info) => style(text).blue(),
        Some(SeverityLevel::Acceptable) => style(text).green(),
        None => style(text).dim(),
    }
}

/// Header line followed by one padded line per row, without styling.
pub fn render_table(rows: &[AggregatedRow], headers: &TableHeaders) -> Vec<String> {
    let line = |name: &str, kind: &str, risk: &str| {
        format!(
            "{} {} {}",
            pad_str(name, NAME_WIDTH, Alignment::Left, Some("…")),
            pad_str(kind, TYPE_WIDTH, Alignment::Left, Some("…")),
            pad_str(risk, RISK_WIDTH, Alignment::Left, Some("…")),
        )
        .trim_end()
        .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(&headers.name, &headers.issue_type, &headers.risk));
    for row in rows {
        let risk = match row.severity {
            Some(level) => headers.severity_name(level),
            None => row.severity_label.as_str(),
        };
        lines.push(line(&row.name, &row.issue_type.to_string(), risk));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::models::{IssueType, RawResult};

    #[test]
    fn test_render_table_lines() {
        let rows = vec![
            AggregatedRow::from_definition(
                &RawResult::new(15, 1),
                &fixtures::definition("Firewall disabled", IssueType::Security, 3),
            ),
            AggregatedRow::from_definition(
                &RawResult::new(30, 1),
                &fixtures::definition("Strange", IssueType::Other, 8),
            ),
        ];
        let lines = render_table(&rows, &TableHeaders::default());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name"));
        assert!(lines[1].starts_with("Firewall disabled"));
        assert!(lines[1].ends_with("High"));
        assert!(lines[2].ends_with("Unknown"));
    }

    #[test]
    fn test_render_truncates_long_names() {
        let long = "x".repeat(80);
        let rows = vec![AggregatedRow::from_definition(
            &RawResult::new(1, 1),
            &fixtures::definition(&long, IssueType::Privacy, 1),
        )];
        let lines = render_table(&rows, &TableHeaders::default());
        assert!(console::measure_text_width(&lines[1]) <= NAME_WIDTH + TYPE_WIDTH + RISK_WIDTH + 2);
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_table(&[], &TableHeaders::default()).len(), 1);
    }
}
