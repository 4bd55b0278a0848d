use crate::chart::{BarData, PieData, Theme};
use crate::dashboard::DashboardSnapshot;
use crate::errors::{ScanviewError, ScanviewResult};
use crate::localize::TableHeaders;
use crate::models::AggregatedRow;
use crate::remediation::RemediationGuide;
use crate::severity::SeverityLevel;
use crate::table::TableView;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything one rendered page needs, taken from a single snapshot.
pub struct ReportInput<'a> {
    pub snapshot: &'a DashboardSnapshot,
    pub headers: &'a TableHeaders,
    pub issues: &'a TableView,
    pub acceptable: &'a TableView,
    pub pie: PieData,
    pub bar: BarData,
}

/// HTML report generator for the risk dashboard.
/// Produces a self-contained page with stat cards, charts and tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReporter;

impl HtmlReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_report(
        &self,
        input: &ReportInput<'_>,
        output_base: &str,
    ) -> ScanviewResult<PathBuf> {
        let html_content = self.generate_html(input)?;
        let filename = PathBuf::from(format!("{}.html", output_base));
        std::fs::write(&filename, html_content)
            .map_err(|e| ScanviewError::io(e, filename.clone()))?;
        log::info!("HTML report generated: {:?}", filename);
        Ok(filename)
    }

    pub fn generate_html(&self, input: &ReportInput<'_>) -> ScanviewResult<String> {
        let snapshot = input.snapshot;
        let headers = input.headers;
        let latest = snapshot.counters.overall.latest();
        let (bg, text, card) = snapshot.theme.page_colors();

        let mut stat_cards = String::new();
        for level in SeverityLevel::ALL {
            stat_cards.push_str(&format!(
                r#"
            <div class="stat-card"><span class="stat-value" style="color:{}">{}</span><span class="stat-label">{}</span></div>"#,
                snapshot.theme.color(level),
                latest.get(level),
                Self::escape_html(headers.severity_name(level)),
            ));
        }

        let guides: BTreeMap<String, RemediationGuide> = input
            .issues
            .rows()
            .iter()
            .chain(input.acceptable.rows())
            .filter_map(|row| {
                snapshot
                    .remediation(row.issue_id, row.result_id)
                    .map(|g| (format!("{}:{}", row.issue_id, row.result_id), g))
            })
            .collect();

        let pie_json = Self::script_json(&input.pie)?;
        let bar_json = Self::script_json(&input.bar)?;
        let guide_json = Self::script_json(&guides)?;

        Ok(format!(r##"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SCANVIEW // RISK DASHBOARD</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{ background: {bg}; color: {text}; font-family: system-ui, sans-serif; font-size: 14px; line-height: 1.5; }}
        .container {{ max-width: 1200px; margin: 0 auto; padding: 2rem; }}
        h1, h2 {{ text-transform: uppercase; letter-spacing: 0.08em; margin-bottom: 1rem; }}
        .meta {{ opacity: 0.6; margin-bottom: 2rem; }}
        .stats {{ display: grid; grid-template-columns: repeat(5, 1fr); gap: 1rem; margin-bottom: 2rem; }}
        .stat-card {{ background: {card}; border-radius: 8px; padding: 1rem; text-align: center; box-shadow: 0 1px 3px rgba(0,0,0,0.2); }}
        .stat-value {{ display: block; font-size: 2rem; font-weight: 700; }}
        .stat-label {{ opacity: 0.7; }}
        .charts-section {{ display: grid; grid-template-columns: 1fr 2fr; gap: 1rem; margin-bottom: 2rem; }}
        .chart-card {{ background: {card}; border-radius: 8px; padding: 1rem; }}
        table {{ width: 100%; border-collapse: collapse; background: {card}; margin-bottom: 2rem; }}
        th, td {{ text-align: left; padding: 0.5rem 1rem; border-bottom: 1px solid rgba(128,128,128,0.2); }}
        tbody tr {{ cursor: pointer; }}
        tbody tr:hover {{ background: rgba(128,128,128,0.1); }}
        .risk-badge {{ padding: 0.1rem 0.6rem; border-radius: 999px; color: #fff; }}
        .drawer {{ position: fixed; top: 0; right: -480px; width: 480px; height: 100%; background: {card}; padding: 2rem; overflow-y: auto; transition: right 0.2s; box-shadow: -2px 0 8px rgba(0,0,0,0.3); }}
        .drawer.open {{ right: 0; }}
        .drawer ol {{ padding-left: 1.5rem; }}
        .drawer img {{ max-width: 100%; margin: 0.5rem 0; }}
        @media (max-width: 768px) {{ .stats {{ grid-template-columns: repeat(2, 1fr); }} .charts-section {{ grid-template-columns: 1fr; }} }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Risk Dashboard</h1>
        <p class="meta">{language} &middot; {runs} runs &middot; generated {generated}</p>

        <div class="stats">{stat_cards}
        </div>

        <div class="charts-section">
            <div class="chart-card"><canvas id="pieChart"></canvas></div>
            <div class="chart-card"><canvas id="barChart"></canvas></div>
        </div>

        <h2>{issues_title} ({issue_count})</h2>
        <table class="issue-table" id="issuesTable">
            <thead><tr><th>{name}</th><th>{issue_type}</th><th>{risk}</th></tr></thead>
            <tbody>{issue_rows}
            </tbody>
        </table>

        <h2>{acceptable_title} ({acceptable_count})</h2>
        <table class="issue-table" id="acceptableTable">
            <thead><tr><th>{name}</th><th>{issue_type}</th><th>{risk}</th></tr></thead>
            <tbody>{acceptable_rows}
            </tbody>
        </table>
    </div>

    <div class="drawer" id="drawer"></div>

    <script>
        const pieData = {pie_json};
        const barData = {bar_json};
        const guides = {guide_json};

        new Chart(document.getElementById('pieChart'), {{
            type: 'pie',
            data: {{ labels: pieData.labels, datasets: [{{ data: pieData.values, backgroundColor: pieData.colors, borderWidth: 0 }}] }},
            options: {{ plugins: {{ legend: {{ position: 'bottom' }} }} }}
        }});

        new Chart(document.getElementById('barChart'), {{
            type: 'bar',
            data: barData,
            options: {{ scales: {{ x: {{ stacked: true }}, y: {{ stacked: true, beginAtZero: true }} }} }}
        }});

        const drawer = document.getElementById('drawer');
        const esc = s => String(s).replace(/[&<>"']/g, c => ({{'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#x27;'}})[c]);

        // One listener per table root
        document.querySelectorAll('.issue-table').forEach(table => {{
            table.addEventListener('click', e => {{
                const row = e.target.closest('tr[data-key]');
                if (!row) return;
                const guide = guides[row.dataset.key];
                if (!guide) return;
                const steps = guide.steps.map(s =>
                    `<li>${{esc(s.text)}}${{s.screenshot ? `<img src="${{esc(s.screenshot)}}">` : ''}}</li>`).join('');
                drawer.innerHTML = `<h2>${{esc(guide.name)}}</h2><p>${{esc(guide.information)}}</p><ol>${{steps}}</ol>`;
                drawer.classList.add('open');
            }});
        }});
        document.addEventListener('keydown', e => {{ if (e.key === 'Escape') drawer.classList.remove('open'); }});
    </script>
</body>
</html>"##,
            lang = snapshot.language.code(),
            bg = bg,
            text = text,
            card = card,
            language = snapshot.language,
            runs = snapshot.counters.runs(),
            generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            stat_cards = stat_cards,
            issues_title = Self::escape_html(&headers.issues_title),
            issue_count = input.issues.len(),
            acceptable_title = Self::escape_html(&headers.acceptable_title),
            acceptable_count = input.acceptable.len(),
            name = Self::escape_html(&headers.name),
            issue_type = Self::escape_html(&headers.issue_type),
            risk = Self::escape_html(&headers.risk),
            issue_rows = Self::table_rows(input.issues.rows(), headers, snapshot.theme),
            acceptable_rows = Self::table_rows(input.acceptable.rows(), headers, snapshot.theme),
            pie_json = pie_json,
            bar_json = bar_json,
            guide_json = guide_json,
        ))
    }

    fn table_rows(rows: &[AggregatedRow], headers: &TableHeaders, theme: Theme) -> String {
        let mut html = String::new();
        for row in rows {
            let (label, color) = match row.severity {
                Some(level) => (headers.severity_name(level), theme.color(level)),
                None => (row.severity_label.as_str(), "#808080"),
            };
            html.push_str(&format!(
                r#"
                <tr data-key="{}:{}"><td>{}</td><td>{}</td><td><span class="risk-badge" style="background:{}">{}</span></td></tr>"#,
                row.issue_id,
                row.result_id,
                Self::escape_html(&row.name),
                row.issue_type,
                color,
                Self::escape_html(label),
            ));
        }
        html
    }

    /// JSON safe to embed inside a `<script>` element.
    fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> ScanviewResult<String> {
        Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
    }

    fn escape_html(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#x27;")
    }
}
