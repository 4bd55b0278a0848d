//! Scanview
//!
//! Security and privacy risk dashboard. Turns raw scan results from a host
//! process into severity-classified tables, per-run risk counters and chart
//! data, and keeps the run history across sessions.

pub mod aggregate;
pub mod backend;
pub mod catalog;
pub mod chart;
pub mod cli;
pub mod counters;
pub mod dashboard;
pub mod errors;
pub mod localize;
pub mod models;
pub mod remediation;
pub mod reporter;
pub mod session;
pub mod severity;
pub mod table;
pub mod ui;
pub mod watcher;

pub use dashboard::{Dashboard, DashboardSnapshot, ScanOutcome};
pub use errors::{ScanviewError, ScanviewResult};
pub use severity::SeverityLevel;
