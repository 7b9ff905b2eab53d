// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hub-backed implementation of the broadcast seam.

use std::sync::Arc;

use uuid::Uuid;

use vigil_core::alert::{Alert, AlertStatistics};
use vigil_core::AlertBroadcaster;

use crate::hub::Hub;
use crate::message::WsMessage;

/// Publishes alert lifecycle changes to all connected hub clients.
pub struct HubBroadcaster {
    hub: Arc<Hub>,
}

impl HubBroadcaster {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}

impl AlertBroadcaster for HubBroadcaster {
    fn alert_created(&self, alert: &Alert) {
        self.hub.broadcast(&WsMessage::alert_created(alert));
    }

    fn alert_acknowledged(&self, alert: &Alert) {
        self.hub.broadcast(&WsMessage::alert_acknowledged(alert));
    }

    fn alert_resolved(&self, alert: &Alert) {
        self.hub.broadcast(&WsMessage::alert_resolved(alert));
    }

    fn alert_deleted(&self, alert_id: Uuid) {
        self.hub.broadcast(&WsMessage::alert_deleted(alert_id));
    }

    fn stats_update(&self, stats: &AlertStatistics) {
        self.hub.broadcast(&WsMessage::stats_update(stats));
    }
}
