use crate::severity::SeverityLevel;

/// Color palette bound to the dashboard theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn color(self, level: SeverityLevel) -> &'static str {
        match (self, level) {
            (Theme::Light, SeverityLevel::High) => "#d93025",
            (Theme::Light, SeverityLevel::Medium) => "#f29900",
            (Theme::Light, SeverityLevel::Low) => "#f4c20d",
            (Theme::Light, SeverityLevel::Info) => "#1a73e8",
            (Theme::Light, SeverityLevel::Acceptable) => "#188038",
            (Theme::Dark, SeverityLevel::High) => "#ff2a6d",
            (Theme::Dark, SeverityLevel::Medium) => "#ff9100",
            (Theme::Dark, SeverityLevel::Low) => "#fcee0a",
            (Theme::Dark, SeverityLevel::Info) => "#05d9e8",
            (Theme::Dark, SeverityLevel::Acceptable) => "#00ff9d",
        }
    }

    /// Page background, text and card colors for the HTML report.
    pub fn page_colors(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Theme::Light => ("#f5f6f8", "#202124", "#ffffff"),
            Theme::Dark => ("#050508", "#e0e0e0", "#0d0d14"),
        }
    }

    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "dark" || v == "1" => Theme::Dark,
            _ => Theme::Light,
        }
    }
}
