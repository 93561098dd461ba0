//! Pulse Dashboard
//!
//! Refresh cycle, alerting and presentation for the futures radar:
//! - [`cycle`]: top-N universe, concurrent per-symbol fetch and classification
//! - [`alert`]: signal transition tracking and alert formatting
//! - [`telegram`]: [`Notifier`](telegram::Notifier) trait and Telegram Bot API client
//! - [`state`] / [`ui`]: ratatui terminal dashboard
//! - [`config`]: environment configuration

pub mod alert;
pub mod config;
pub mod cycle;
pub mod state;
pub mod telegram;
pub mod ui;

pub use alert::{AlertSummary, SignalTracker, dispatch_alerts, format_alert};
pub use config::{ConfigError, CvdSource, DashboardConfig};
pub use cycle::{Analysis, AnalysisError, CycleReport, analyse_symbol, run_cycle};
pub use telegram::{Notifier, NotifyError, TelegramConfig, TelegramNotifier};

use std::{fs::File, sync::Mutex};
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stdout, filtered by `RUST_LOG` (default "info").
pub fn init_logging() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Log to `path` so output does not corrupt the terminal UI.
pub fn init_file_logging(path: &str) -> std::io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
