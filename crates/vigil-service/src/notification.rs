// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification delivery across external sinks.
//!
//! The service filters by a minimum severity and a global per-minute rate
//! cap, then fans the message out to every enabled sink. Sinks are wrapped
//! in a circuit breaker so a misbehaving endpoint is short-circuited rather
//! than hammered.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use vigil_core::alert::AlertSeverity;
use vigil_core::{NotificationMessage, Notifier, VigilError};
use vigil_metrics::recording;
use vigil_resilience::CircuitBreaker;

struct RateWindow {
    sent: HashMap<String, u32>,
    last_reset: Instant,
}

/// Sends notifications through all enabled sinks.
pub struct NotificationService {
    notifiers: Vec<Arc<dyn Notifier>>,
    min_severity: AlertSeverity,
    rate_limit_per_minute: u32,
    window: std::sync::Mutex<RateWindow>,
}

impl NotificationService {
    /// Keeps only the sinks that report themselves enabled.
    pub fn new(
        notifiers: Vec<Arc<dyn Notifier>>,
        min_severity: AlertSeverity,
        rate_limit_per_minute: u32,
    ) -> Self {
        let active: Vec<Arc<dyn Notifier>> = notifiers
            .into_iter()
            .filter(|n| {
                let enabled = n.is_enabled();
                if enabled {
                    info!(notifier = n.name(), "notification channel enabled");
                }
                enabled
            })
            .collect();

        Self {
            notifiers: active,
            min_severity,
            rate_limit_per_minute,
            window: std::sync::Mutex::new(RateWindow {
                sent: HashMap::new(),
                last_reset: Instant::now(),
            }),
        }
    }

    /// Deliver `msg` to every sink.
    ///
    /// Messages below the severity threshold or over the rate cap are
    /// silently dropped. Per-sink failures are logged; the last one is
    /// returned so the consumer retry path engages.
    pub async fn notify(&self, msg: &NotificationMessage) -> Result<(), VigilError> {
        if msg.severity.priority() > self.min_severity.priority() {
            debug!(
                severity = %msg.severity,
                min_severity = %self.min_severity,
                "notification skipped due to severity threshold"
            );
            return Ok(());
        }

        if !self.check_rate_limit(&msg.alert_id) {
            warn!(alert_id = msg.alert_id.as_str(), "notification rate limited");
            return Ok(());
        }

        let mut last_err = None;
        for notifier in &self.notifiers {
            match notifier.send(msg).await {
                Ok(()) => recording::record_notification(notifier.name(), "success"),
                Err(err) => {
                    error!(
                        notifier = notifier.name(),
                        alert_id = msg.alert_id.as_str(),
                        error = %err,
                        "failed to send notification"
                    );
                    recording::record_notification(notifier.name(), "error");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Global sliding-minute cap across all alerts.
    fn check_rate_limit(&self, alert_id: &str) -> bool {
        let mut window = self.window.lock().expect("rate window lock poisoned");

        if window.last_reset.elapsed() > std::time::Duration::from_secs(60) {
            window.sent.clear();
            window.last_reset = Instant::now();
        }

        let total: u32 = window.sent.values().sum();
        if total >= self.rate_limit_per_minute {
            return false;
        }

        *window.sent.entry(alert_id.to_string()).or_insert(0) += 1;
        true
    }

    pub fn active_notifiers(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }
}

/// A [`Notifier`] wrapped with circuit breaker protection.
pub struct ResilientNotifier {
    inner: Arc<dyn Notifier>,
    breaker: Arc<CircuitBreaker>,
}

impl ResilientNotifier {
    pub fn new(inner: Arc<dyn Notifier>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { inner, breaker }
    }
}

#[async_trait]
impl Notifier for ResilientNotifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    async fn send(&self, msg: &NotificationMessage) -> Result<(), VigilError> {
        self.breaker.call(|| self.inner.send(msg)).await
    }
}
