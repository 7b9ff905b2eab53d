// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the Vigil alerting service.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text format via [`PrometheusMetrics::render`],
//! exposed through the gateway's `/metrics` endpoint. Emitting code calls
//! the [`recording`] helpers, which are no-ops when no recorder is
//! installed (tests, embedded use).

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Process-wide Prometheus recorder.
///
/// Only one recorder can be installed per process; construction fails if
/// another recorder is already registered.
pub struct PrometheusMetrics {
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    pub fn install() -> Result<Self, String> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| format!("failed to install Prometheus recorder: {e}"))?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
