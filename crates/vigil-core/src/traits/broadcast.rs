// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time broadcast seam.

use uuid::Uuid;

use crate::alert::{Alert, AlertStatistics};

/// Pushes lifecycle changes to connected real-time subscribers.
///
/// All methods are best-effort and non-blocking: a slow or absent broadcast
/// plane never fails a lifecycle command. Implemented by the WebSocket hub;
/// tests substitute a recording stub.
pub trait AlertBroadcaster: Send + Sync {
    fn alert_created(&self, alert: &Alert);

    fn alert_acknowledged(&self, alert: &Alert);

    fn alert_resolved(&self, alert: &Alert);

    fn alert_deleted(&self, alert_id: Uuid);

    fn stats_update(&self, stats: &AlertStatistics);
}
