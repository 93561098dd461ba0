//! Terminal dashboard: top volatile futures with signals, refreshed on a fixed interval.

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pulse_dashboard::{
    DashboardConfig, SignalTracker, TelegramNotifier, dispatch_alerts, init_file_logging,
    run_cycle,
    state::DashboardState,
    telegram::{Notifier, TEST_MESSAGE},
    ui,
};
use pulse_data::BinanceFuturesClient;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    sync::{Mutex, mpsc},
    time::MissedTickBehavior,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Arc::new(DashboardConfig::from_env()?);
    init_file_logging(&config.log_file)?;

    let client = Arc::new(BinanceFuturesClient::new(config.binance.clone())?);
    let notifier = match &config.telegram {
        Some(telegram) => Some(Arc::new(TelegramNotifier::new(telegram.clone())?)),
        None => None,
    };
    info!(
        top_n = config.universe.top_n,
        timeframe = %config.timeframe,
        alerts = config.alerts_enabled(),
        "starting dashboard"
    );

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let state = Arc::new(Mutex::new(DashboardState::default()));
    let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);

    // Refresh loop: interval ticks and manual refresh requests
    {
        let state = Arc::clone(&state);
        let config = Arc::clone(&config);
        let client = Arc::clone(&client);
        let alert_notifier = notifier.clone().filter(|_| config.alerts_enabled());
        tokio::spawn(async move {
            let mut tracker = SignalTracker::new();
            let mut interval = tokio::time::interval(config.refresh);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    request = refresh_rx.recv() => {
                        if request.is_none() {
                            break;
                        }
                        interval.reset();
                    }
                }

                state.lock().await.refreshing = true;
                let report = run_cycle(client.as_ref(), &config).await;
                let summary = dispatch_alerts(
                    &mut tracker,
                    alert_notifier
                        .as_deref()
                        .map(|notifier| notifier as &dyn Notifier),
                    &report.analyses,
                )
                .await;

                let mut guard = state.lock().await;
                guard.apply(&report);
                if summary.sent > 0 || summary.failed > 0 {
                    guard.set_status(format!(
                        "alerts: {} sent, {} failed",
                        summary.sent, summary.failed
                    ));
                }
            }
        });
    }

    // UI loop
    let mut last_draw = Instant::now();
    let draw_interval = Duration::from_millis(250);

    let result: Result<(), Box<dyn Error>> = loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        // Manual refresh refetches tickers and exchange info
                        client.clear_cache();
                        // A full channel means a refresh is already queued
                        let _ = refresh_tx.try_send(());
                        state.lock().await.set_status("manual refresh requested");
                    }
                    KeyCode::Char('t') | KeyCode::Char('T') => match &notifier {
                        Some(notifier) => {
                            let notifier = Arc::clone(notifier);
                            let state = Arc::clone(&state);
                            state.lock().await.set_status("sending Telegram test message...");
                            tokio::spawn(async move {
                                let status = match notifier.send(TEST_MESSAGE).await {
                                    Ok(()) => "Telegram test message sent".to_string(),
                                    Err(error) => {
                                        warn!(%error, "Telegram test message failed");
                                        format!("Telegram test failed: {error}")
                                    }
                                };
                                state.lock().await.set_status(status);
                            });
                        }
                        None => {
                            state
                                .lock()
                                .await
                                .set_status("set TG_BOT_TOKEN and TG_CHAT_ID to enable Telegram");
                        }
                    },
                    _ => {}
                }
            }
        }

        if last_draw.elapsed() >= draw_interval {
            let snapshot = state.lock().await.clone();
            terminal.draw(|f| ui::render(f, &snapshot, &config))?;
            last_draw = Instant::now();
        }
    };

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    info!("dashboard closed");

    result
}
