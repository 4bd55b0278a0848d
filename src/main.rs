use clap::Parser;
use console::style;
use env_logger::Env;
use scanview::backend::{Backend, FileBackend, HostProcessBackend, ScanBackend};
use scanview::catalog::{CatalogProvider, DirCatalogProvider, Language};
use scanview::chart::{BarChart, PieChart, SeverityVisibility};
use scanview::cli::Args;
use scanview::localize::{MessageTable, TableHeaders};
use scanview::reporter::{HtmlReporter, ReportInput};
use scanview::session::SessionStore;
use scanview::table::{SortColumn, TableAction, TableEvent};
use scanview::ui::TerminalUI;
use scanview::watcher::ResultsWatcher;
use scanview::{Dashboard, ScanviewResult};
use std::collections::BTreeSet;

fn display_banner() {
    println!();
    println!(
        "    {} {}",
        style("SCANVIEW").cyan().bold(),
        style(format!("v{} // security & privacy risk dashboard", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let log_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    if !args.quiet {
        display_banner();
    }
    log::info!("Scanview starting with args: {:?}", args);

    let ui = TerminalUI::new(args.quiet);
    let catalogs = DirCatalogProvider::load(&args.catalogs)?;
    let language = args.language.map(Language::from_index).transpose()?;

    let backend = match (&args.results, &args.host) {
        (_, Some(host)) => Backend::Host(HostProcessBackend::new(host)),
        (Some(results), None) => {
            let mut file = FileBackend::new(results);
            if let Some(settings) = &args.settings {
                file = file.with_settings(settings);
            }
            Backend::File(file.attach_catalog(&catalogs, language).await?)
        }
        (None, None) => return Err("either --results or --host is required".into()),
    };

    let session = SessionStore::open(&args.session)?;
    let dashboard = Dashboard::open(backend, catalogs, session, language).await?;
    if let Some(theme) = args.theme {
        dashboard.set_theme(theme).await;
    }

    let outcome = ui.while_scanning(dashboard.trigger_scan()).await;
    ui.print_outcome(&outcome);
    render(&dashboard, &args, &ui, &args.sort).await?;

    if args.watch {
        if let Some(results) = &args.results {
            let (watcher, rx) = ResultsWatcher::new(results);
            let (dashboard, args, ui) = (&dashboard, &args, &ui);
            watcher
                .watch(dashboard, rx, move |outcome| async move {
                    ui.print_outcome(&outcome);
                    if let Err(e) = render(dashboard, args, ui, &[]).await {
                        log::error!("Could not render dashboard: {}", e);
                    }
                })
                .await?;
        }
    }

    Ok(())
}

/// Print tables and summary for the current snapshot and write the HTML
/// page when requested. `sorts` are replayed as header clicks.
async fn render<B: ScanBackend, P: CatalogProvider>(
    dashboard: &Dashboard<B, P>,
    args: &Args,
    ui: &TerminalUI,
    sorts: &[SortColumn],
) -> ScanviewResult<()> {
    let snapshot = dashboard.snapshot().await;
    let messages = MessageTable::load(&args.catalogs.join("locales"), snapshot.language)?;
    let headers = TableHeaders::resolve(&messages).await;

    let mut issues = snapshot.issues_table();
    if !args.filter.is_empty() {
        let selected: BTreeSet<_> = args.filter.iter().copied().collect();
        issues.apply_filter(&snapshot.raw, &snapshot.catalog, &selected);
    }
    for &column in sorts {
        if let Some(TableAction::Sorted(state)) = issues.handle(TableEvent::HeaderClicked(column)) {
            dashboard.save_sort(state).await?;
        }
    }
    let acceptable = snapshot.acceptable_table();

    ui.print_table(&headers.issues_title, &issues, &headers);
    ui.print_table(&headers.acceptable_title, &acceptable, &headers);
    if args.verbose {
        for row in issues.rows() {
            if let Some(guide) = snapshot.remediation(row.issue_id, row.result_id) {
                ui.print_remediation(&guide);
            }
        }
    }
    ui.print_summary(&snapshot.counters.overall, &headers);

    if let Some(base) = &args.output {
        let mut bar = BarChart::new(snapshot.theme);
        if let Err(e) = bar.set_window(args.window) {
            log::warn!("{}; keeping a window of {} runs", e, bar.window_size());
        }
        bar.set_visibility(SeverityVisibility::hidden(&args.hide));

        let input = ReportInput {
            snapshot: &snapshot,
            headers: &headers,
            issues: &issues,
            acceptable: &acceptable,
            pie: PieChart::new(&snapshot.counters.overall, snapshot.theme)
                .data_with_labels(Some(&headers.severities)),
            bar: bar.data_with_labels(&snapshot.counters.overall, Some(&headers.severities))?,
        };
        let path = HtmlReporter::new().generate_report(&input, base)?;
        if !args.quiet {
            println!(
                "    {} Dashboard written to {}",
                style("▶").green(),
                style(path.display()).white().bold()
            );
        }
    }

    Ok(())
}
