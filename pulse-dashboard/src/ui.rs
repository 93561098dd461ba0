//! Terminal rendering of [`DashboardState`].

use crate::{
    alert::format_price,
    config::{CvdSource, DashboardConfig},
    state::{DashboardState, Row as StateRow},
};
use pulse_core::Signal;
use pulse_data::UniverseSource;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

const HEADERS: [&str; 13] = [
    "Symbol", "Price", "24h %", "ATR", "ATR %", "Funding", "OI", "CVD", "Signal", "TP", "SL",
    "R:R", "Reason",
];

pub fn render(f: &mut Frame, state: &DashboardState, config: &DashboardConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], state, config);
    render_table(f, chunks[1], state);
    render_status(f, chunks[2], state);
    render_footer(f, chunks[3], config);
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState, config: &DashboardConfig) {
    let updated = state
        .last_update
        .map(|time| time.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "waiting for first cycle".to_string());

    let universe = match state.universe_source {
        Some(UniverseSource::Tickers) => Span::styled("top volatile", Style::default().fg(Color::Cyan)),
        Some(UniverseSource::Fallback) => Span::styled("fallback list", Style::default().fg(Color::Yellow)),
        None => Span::raw("-"),
    };

    let (long, short) = state.directional_counts();
    let mut spans = vec![
        Span::styled(
            " PULSE ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {} x {} | ATR {} | CVD {} ({}) | ",
            config.universe.top_n,
            config.timeframe,
            config.atr_period,
            match config.cvd_source {
                CvdSource::Candle => "candle",
                CvdSource::Taker => "taker",
            },
            config.cvd_interval,
        )),
        universe,
        Span::raw(format!(" | updated {updated} | ")),
        Span::styled(format!("{long} long"), Style::default().fg(Color::Green)),
        Span::raw(" / "),
        Span::styled(format!("{short} short"), Style::default().fg(Color::Red)),
    ];
    if state.refreshing {
        spans.push(Span::styled(
            "  refreshing...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn signal_color(signal: Signal) -> Color {
    match signal {
        Signal::ScalpLong => Color::Green,
        Signal::ScalpShort => Color::Red,
        Signal::Wait => Color::DarkGray,
    }
}

fn signed_color(value: f64) -> Color {
    if value > 0.0 {
        Color::Green
    } else if value < 0.0 {
        Color::Red
    } else {
        Color::White
    }
}

fn table_row(row: &StateRow) -> Row<'static> {
    let analysis = &row.analysis;
    let plan_cells = match &analysis.plan {
        Some(plan) => [
            format_price(plan.take_profit),
            format_price(plan.stop_loss),
            format!("{:.2}", plan.risk_reward),
        ],
        None => ["-".to_string(), "-".to_string(), "-".to_string()],
    };
    let [take_profit, stop_loss, risk_reward] = plan_cells;

    let symbol_style = match (row.stale, analysis.signal) {
        (true, _) => Style::default().fg(Color::DarkGray),
        (false, Signal::Wait) => Style::default().fg(Color::Yellow),
        (false, signal) => Style::default()
            .fg(signal_color(signal))
            .add_modifier(Modifier::BOLD),
    };

    Row::new(vec![
        Cell::from(analysis.symbol.clone()).style(symbol_style),
        Cell::from(format_price(analysis.price)),
        Cell::from(format!("{:+.2}", analysis.price_change_pct_24h))
            .style(Style::default().fg(signed_color(analysis.price_change_pct_24h))),
        Cell::from(format_price(analysis.atr)),
        Cell::from(format!("{:.2}", analysis.atr_pct)),
        Cell::from(format!("{:.4}%", analysis.funding_rate * 100.0))
            .style(Style::default().fg(signed_color(analysis.funding_rate))),
        Cell::from(scale_number(analysis.open_interest)),
        Cell::from(scale_number(analysis.cvd))
            .style(Style::default().fg(signed_color(analysis.cvd))),
        Cell::from(analysis.signal.to_string()).style(
            Style::default()
                .fg(signal_color(analysis.signal))
                .add_modifier(Modifier::BOLD),
        ),
        Cell::from(take_profit),
        Cell::from(stop_loss),
        Cell::from(risk_reward),
        Cell::from(analysis.reason.clone()).style(Style::default().fg(Color::Gray)),
    ])
    .style(Style::default().fg(match analysis.signal {
        Signal::Wait => Color::White,
        signal => signal_color(signal),
    }))
}

fn render_table(f: &mut Frame, area: Rect, state: &DashboardState) {
    let header = Row::new(HEADERS.iter().map(|title| {
        Cell::from(*title).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .height(1);

    let table = Table::new(
        state.rows.iter().map(table_row),
        [
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" FUTURES RADAR ")
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(table, area);
}

fn render_status(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut lines = Vec::new();
    if let Some(status) = &state.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }
    if state.failures.is_empty() {
        lines.push(Line::from(Span::styled(
            "all symbols analysed",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(state.failures.iter().map(|failure| {
            Line::from(Span::styled(failure.clone(), Style::default().fg(Color::Red)))
        }));
    }

    let status = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" STATUS "));
    f.render_widget(status, area);
}

fn render_footer(f: &mut Frame, area: Rect, config: &DashboardConfig) {
    let telegram = if config.alerts_enabled() {
        Span::styled("alerts on", Style::default().fg(Color::Green))
    } else if config.telegram.is_some() {
        Span::styled("alerts muted", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("telegram not configured", Style::default().fg(Color::DarkGray))
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::raw(format!(
            " Refresh: {}s  |  [r] Refresh  [t] Test Telegram  [q] Quit  |  ",
            config.refresh.as_secs()
        )),
        telegram,
    ]));
    f.render_widget(footer, area);
}

/// Scale large numbers into a compact value with a K/M/B suffix.
pub fn scale_number(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{value:.2}")
    }
}
