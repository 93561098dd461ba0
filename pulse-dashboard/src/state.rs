//! Dashboard view state, updated once per refresh cycle.

use crate::cycle::{Analysis, CycleReport};
use chrono::{DateTime, Utc};
use pulse_core::Signal;
use pulse_data::UniverseSource;
use std::collections::HashMap;

/// One table row. `stale` rows kept their previous analysis because this cycle failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub analysis: Analysis,
    pub stale: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub rows: Vec<Row>,
    pub universe_source: Option<UniverseSource>,
    pub last_update: Option<DateTime<Utc>>,
    /// `symbol: error` for symbols that failed the last cycle
    pub failures: Vec<String>,
    /// Transient status line (eg/ Telegram test result)
    pub status: Option<String>,
    pub refreshing: bool,
    pub cycles: u64,
}

impl DashboardState {
    /// Replace rows with the latest cycle, in universe order.
    ///
    /// A symbol that failed with a transient error keeps its previous row (marked stale) if it
    /// had one. Non-transient failures and symbols that left the universe are dropped.
    pub fn apply(&mut self, report: &CycleReport) {
        let mut previous: HashMap<String, Analysis> = self
            .rows
            .drain(..)
            .map(|row| (row.analysis.symbol.clone(), row.analysis))
            .collect();

        self.rows = report
            .universe
            .symbols
            .iter()
            .filter_map(|symbol| match report.analysis(symbol) {
                Some(analysis) => Some(Row {
                    analysis: analysis.clone(),
                    stale: false,
                }),
                None => report
                    .failure(symbol)
                    .filter(|error| error.is_transient())
                    .and_then(|_| previous.remove(symbol))
                    .map(|analysis| Row {
                        analysis,
                        stale: true,
                    }),
            })
            .collect();

        self.failures = report
            .failures
            .iter()
            .map(|(symbol, error)| {
                if error.is_transient() {
                    format!("{symbol}: {error}")
                } else {
                    format!("{symbol}: {error} (dropped)")
                }
            })
            .collect();
        self.universe_source = Some(report.universe.source);
        self.last_update = Some(report.finished);
        self.refreshing = false;
        self.cycles += 1;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Count of (long, short) rows.
    pub fn directional_counts(&self) -> (usize, usize) {
        self.rows
            .iter()
            .fold((0, 0), |(long, short), row| match row.analysis.signal {
                Signal::ScalpLong => (long + 1, short),
                Signal::ScalpShort => (long, short + 1),
                Signal::Wait => (long, short),
            })
    }
}
