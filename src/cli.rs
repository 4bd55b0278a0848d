use crate::chart::{Theme, DEFAULT_WINDOW};
use crate::severity::SeverityLevel;
use crate::table::SortColumn;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "scanview",
    about = "Scanview - Security and privacy risk dashboard for host scan results",
    version
)]
#[command(group(ArgGroup::new("source").required(true).args(["results", "host"])))]
pub struct Args {
    /// Raw scan results JSON file
    #[arg(short, long)]
    pub results: Option<PathBuf>,

    /// Native host program, invoked as `<PROGRAM> <Command>`
    #[arg(long)]
    pub host: Option<PathBuf>,

    /// User settings JSON (file backend only)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Directory of issue catalogs, with message tables under `locales/`
    #[arg(short, long, default_value = "catalogs")]
    pub catalogs: PathBuf,

    /// Language index (0 = English .. 6 = Estonian), overrides user settings
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..=6))]
    pub language: Option<i64>,

    /// Session state file
    #[arg(long, default_value = ".scanview-session.json")]
    pub session: PathBuf,

    /// Number of runs shown in the bar chart
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_WINDOW,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub window: usize,

    /// Severity levels hidden from the bar chart
    #[arg(long, value_delimiter = ',')]
    pub hide: Vec<SeverityLevel>,

    /// Dashboard theme, overrides user settings
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Sort the issues table; repeat to click the same header again
    #[arg(short, long)]
    pub sort: Vec<SortColumn>,

    /// Only list issues with these severity levels
    #[arg(short, long, value_delimiter = ',')]
    pub filter: Vec<SeverityLevel>,

    /// Write an HTML dashboard to `<BASE>.html`
    #[arg(short, long)]
    pub output: Option<String>,

    /// Re-scan whenever the results file changes
    #[arg(long, conflicts_with = "host")]
    pub watch: bool,

    /// Enable verbose logging of all operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Hide progress spinners and tables
    #[arg(short, long)]
    pub quiet: bool,
}
