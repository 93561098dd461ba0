//! Signal transition tracking and alert delivery.

use crate::{cycle::Analysis, telegram::Notifier};
use fnv::FnvHashMap;
use pulse_core::Signal;
use tracing::{info, warn};

/// Last directional [`Signal`] alerted per symbol.
///
/// A symbol alerts when it turns directional or flips direction. Returning to
/// [`Signal::Wait`] forgets the symbol, so the next directional label alerts again.
#[derive(Debug, Default)]
pub struct SignalTracker {
    last: FnvHashMap<String, Signal>,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `signal` for `symbol`, returning true if it should be alerted.
    pub fn observe(&mut self, symbol: &str, signal: Signal) -> bool {
        if !signal.is_directional() {
            self.last.remove(symbol);
            return false;
        }

        match self.last.insert(symbol.to_string(), signal) {
            Some(previous) => previous != signal,
            None => true,
        }
    }

    pub fn last(&self, symbol: &str) -> Option<Signal> {
        self.last.get(symbol).copied()
    }
}

/// Markdown alert for a directional [`Analysis`].
pub fn format_alert(analysis: &Analysis) -> String {
    let mut message = format!(
        "*{}*  `{}`\nPrice: {}\n24h: {:+.2}%  Funding: {:.6}\nCVD: {:.2}  ATR: {:.2}%\n_{}_",
        analysis.signal,
        analysis.symbol,
        format_price(analysis.price),
        analysis.price_change_pct_24h,
        analysis.funding_rate,
        analysis.cvd,
        analysis.atr_pct,
        analysis.reason,
    );

    if let Some(plan) = &analysis.plan {
        message.push_str(&format!(
            "\nEntry: {}  TP: {}  SL: {}  R:R {:.2}",
            format_price(plan.entry),
            format_price(plan.take_profit),
            format_price(plan.stop_loss),
            plan.risk_reward,
        ));
    }

    message
}

/// Price rounded to 6 decimals with trailing zeros removed.
pub fn format_price(price: f64) -> String {
    let formatted = format!("{price:.6}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Alerts attempted by [`dispatch_alerts`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct AlertSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Update `tracker` with every analysis and notify the transitions.
///
/// When `notifier` is `None` the tracker is still updated, so enabling alerts later does not
/// replay labels that were already on screen.
pub async fn dispatch_alerts(
    tracker: &mut SignalTracker,
    notifier: Option<&dyn Notifier>,
    analyses: &[Analysis],
) -> AlertSummary {
    let mut summary = AlertSummary::default();

    for analysis in analyses {
        if !tracker.observe(&analysis.symbol, analysis.signal) {
            continue;
        }
        let Some(notifier) = notifier else {
            continue;
        };

        match notifier.send(&format_alert(analysis)).await {
            Ok(()) => {
                info!(symbol = %analysis.symbol, signal = %analysis.signal, "alert sent");
                summary.sent += 1;
            }
            Err(error) => {
                warn!(symbol = %analysis.symbol, %error, "alert delivery failed");
                summary.failed += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::NotifyError;
    use async_trait::async_trait;
    use chrono::Utc;
    use pulse_core::{PlanConfig, TradePlan};
    use std::sync::Mutex;

    #[test]
    fn test_signal_tracker_transitions() {
        struct TestCase {
            input: Signal,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: first Wait is silent
                input: Signal::Wait,
                expected: false,
            },
            TestCase {
                // TC1: turns long
                input: Signal::ScalpLong,
                expected: true,
            },
            TestCase {
                // TC2: still long
                input: Signal::ScalpLong,
                expected: false,
            },
            TestCase {
                // TC3: flips short
                input: Signal::ScalpShort,
                expected: true,
            },
            TestCase {
                // TC4: back to wait
                input: Signal::Wait,
                expected: false,
            },
            TestCase {
                // TC5: same direction as before the wait alerts again
                input: Signal::ScalpShort,
                expected: true,
            },
        ];

        let mut tracker = SignalTracker::new();
        for (index, test) in tests.into_iter().enumerate() {
            let actual = tracker.observe("BTCUSDT", test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
        assert_eq!(tracker.last("BTCUSDT"), Some(Signal::ScalpShort));
        assert_eq!(tracker.last("ETHUSDT"), None);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(64_250.5), "64250.5");
        assert_eq!(format_price(0.000123456789), "0.000123");
        assert_eq!(format_price(100.0), "100");
    }

    fn analysis(symbol: &str, signal: Signal) -> Analysis {
        Analysis {
            symbol: symbol.to_string(),
            price: 100.0,
            price_change_pct_24h: 4.25,
            atr: 1.0,
            atr_pct: 1.0,
            funding_rate: -0.0008,
            open_interest: 1_000.0,
            cvd: 1_234.5,
            signal,
            reason: "squeeze".to_string(),
            plan: TradePlan::new(signal, 100.0, 1.0, &PlanConfig::default()),
            time: Utc::now(),
        }
    }

    #[test]
    fn test_format_alert() {
        let message = format_alert(&analysis("SOLUSDT", Signal::ScalpLong));
        assert_eq!(
            message,
            "*SCALP LONG*  `SOLUSDT`\nPrice: 100\n24h: +4.25%  Funding: -0.000800\n\
             CVD: 1234.50  ATR: 1.00%\n_squeeze_\nEntry: 100  TP: 105  SL: 97  R:R 1.67"
        );
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Http("unreachable".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_alerts() {
        let notifier = RecordingNotifier::default();
        let mut tracker = SignalTracker::new();

        let first = vec![
            analysis("AAAUSDT", Signal::ScalpLong),
            analysis("BBBUSDT", Signal::Wait),
        ];
        let summary = dispatch_alerts(&mut tracker, Some(&notifier), &first).await;
        assert_eq!(summary, AlertSummary { sent: 1, failed: 0 });

        // Unchanged labels stay quiet, new directional label alerts
        let second = vec![
            analysis("AAAUSDT", Signal::ScalpLong),
            analysis("BBBUSDT", Signal::ScalpShort),
        ];
        let summary = dispatch_alerts(&mut tracker, Some(&notifier), &second).await;
        assert_eq!(summary, AlertSummary { sent: 1, failed: 0 });

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("`AAAUSDT`"));
        assert!(sent[1].starts_with("*SCALP SHORT*  `BBBUSDT`"));
    }

    #[tokio::test]
    async fn test_dispatch_alerts_failures_and_muted() {
        let failing = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let mut tracker = SignalTracker::new();
        let analyses = vec![analysis("AAAUSDT", Signal::ScalpShort)];

        let summary = dispatch_alerts(&mut tracker, Some(&failing), &analyses).await;
        assert_eq!(summary, AlertSummary { sent: 0, failed: 1 });

        // Muted dispatch still tracks, so nothing is replayed for the same label
        let mut tracker = SignalTracker::new();
        let summary = dispatch_alerts(&mut tracker, None, &analyses).await;
        assert_eq!(summary, AlertSummary::default());
        assert_eq!(tracker.last("AAAUSDT"), Some(Signal::ScalpShort));
    }
}
