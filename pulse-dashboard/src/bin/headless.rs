//! Log-only radar: runs the refresh cycle forever and logs (or prints as JSON) each analysis.

use pulse_dashboard::{
    DashboardConfig, SignalTracker, TelegramNotifier, dispatch_alerts, init_logging, run_cycle,
    telegram::Notifier,
};
use pulse_data::BinanceFuturesClient;
use std::error::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = DashboardConfig::from_env()?;
    let client = BinanceFuturesClient::new(config.binance.clone())?;
    let notifier = match (&config.telegram, config.alerts_enabled()) {
        (Some(telegram), true) => Some(TelegramNotifier::new(telegram.clone())?),
        _ => None,
    };

    info!(
        top_n = config.universe.top_n,
        timeframe = %config.timeframe,
        refresh_secs = config.refresh.as_secs(),
        alerts = notifier.is_some(),
        "starting headless radar"
    );

    let mut tracker = SignalTracker::new();
    let mut interval = tokio::time::interval(config.refresh);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Registered once so a ctrl-c during a cycle is seen at the next tick
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
        }

        let report = run_cycle(&client, &config).await;
        for analysis in &report.analyses {
            if config.json_output {
                match serde_json::to_string(analysis) {
                    Ok(line) => println!("{line}"),
                    Err(error) => error!(%error, symbol = %analysis.symbol, "failed to serialise analysis"),
                }
            } else {
                info!(
                    symbol = %analysis.symbol,
                    signal = %analysis.signal,
                    price = analysis.price,
                    change_pct = analysis.price_change_pct_24h,
                    funding = analysis.funding_rate,
                    cvd = analysis.cvd,
                    atr_pct = analysis.atr_pct,
                    "analysis"
                );
            }
        }

        let summary = dispatch_alerts(
            &mut tracker,
            notifier.as_ref().map(|notifier| notifier as &dyn Notifier),
            &report.analyses,
        )
        .await;
        if summary.failed > 0 {
            warn!(failed = summary.failed, "some alerts were not delivered");
        }
    }

    Ok(())
}
