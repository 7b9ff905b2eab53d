// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed recording helpers for the metrics emitted across the pipeline.
//!
//! All helpers go through the `metrics` facade, so they are no-ops until a
//! recorder is installed. The active-alerts gauge is decremented exactly
//! once when an alert leaves `active`, whether via acknowledge or a direct
//! resolve.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register metric descriptions with the installed recorder.
pub fn register_metrics() {
    describe_counter!("alerts_created_total", "Total alerts created, labeled by severity");
    describe_counter!("alerts_acknowledged_total", "Total alerts acknowledged");
    describe_counter!("alerts_resolved_total", "Total alerts resolved");
    describe_counter!("alerts_deleted_total", "Total alerts deleted");
    describe_counter!("alerts_expired_total", "Total alerts expired");
    describe_gauge!("alerts_active", "Alerts currently in active status");

    describe_counter!(
        "events_published_total",
        "Events published, labeled by type and stream"
    );
    describe_counter!(
        "events_consumed_total",
        "Events consumed, labeled by type and outcome"
    );
    describe_counter!(
        "events_dead_lettered_total",
        "Events moved to the dead-letter stream, labeled by type"
    );

    describe_counter!("websocket_connections_total", "Total WebSocket connections accepted");
    describe_gauge!("websocket_connections_active", "Currently connected WebSocket clients");
    describe_counter!("websocket_messages_sent_total", "Messages enqueued to WebSocket clients");

    describe_counter!(
        "notifications_sent_total",
        "Notifications sent, labeled by sink and outcome"
    );
}

pub fn record_alert_created(severity: &str) {
    counter!("alerts_created_total", "severity" => severity.to_string()).increment(1);
    gauge!("alerts_active").increment(1.0);
}

pub fn record_alert_acknowledged() {
    counter!("alerts_acknowledged_total").increment(1);
    gauge!("alerts_active").decrement(1.0);
}

/// `was_active` marks a resolve that skipped the acknowledged state; only
/// then does the active gauge drop here.
pub fn record_alert_resolved(was_active: bool) {
    counter!("alerts_resolved_total").increment(1);
    if was_active {
        gauge!("alerts_active").decrement(1.0);
    }
}

pub fn record_alert_deleted() {
    counter!("alerts_deleted_total").increment(1);
}

pub fn record_alert_expired() {
    counter!("alerts_expired_total").increment(1);
    gauge!("alerts_active").decrement(1.0);
}

pub fn record_event_published(event_type: &str, stream: &str) {
    counter!(
        "events_published_total",
        "type" => event_type.to_string(),
        "stream" => stream.to_string()
    )
    .increment(1);
}

pub fn record_event_consumed(event_type: &str, outcome: &str) {
    counter!(
        "events_consumed_total",
        "type" => event_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_event_dead_lettered(event_type: &str) {
    counter!("events_dead_lettered_total", "type" => event_type.to_string()).increment(1);
}

pub fn record_ws_connection() {
    counter!("websocket_connections_total").increment(1);
}

pub fn set_ws_active(count: usize) {
    gauge!("websocket_connections_active").set(count as f64);
}

pub fn record_ws_messages_sent(count: usize) {
    counter!("websocket_messages_sent_total").increment(count as u64);
}

pub fn record_notification(sink: &str, outcome: &str) {
    counter!(
        "notifications_sent_total",
        "sink" => sink.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
