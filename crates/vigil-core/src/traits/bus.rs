// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event bus seams: publishing, subscribing, and event handling.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VigilError;
use crate::event::Event;

/// Publishes events onto named streams.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish to the default stream derived from the event type.
    async fn publish(&self, event: &Event) -> Result<(), VigilError>;

    /// Publish to an explicit stream.
    async fn publish_to_stream(&self, stream: &str, event: &Event) -> Result<(), VigilError>;
}

/// Processes one event delivered by a consumer loop.
///
/// Delivery is at-least-once; implementations must be idempotent keyed by
/// `(event.id, event.event_type)` because retries arrive as republished
/// copies.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> Result<(), VigilError>;
}

/// Subscribes consumer groups to streams.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Create the group if absent and spawn a consumer loop feeding
    /// `handler`. Subscribing to an existing group is not an error.
    async fn subscribe(
        &self,
        stream: &str,
        group: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), VigilError>;

    /// Signal all consumer loops to stop after their current read window
    /// and wait for them to drain.
    async fn unsubscribe(&self) -> Result<(), VigilError>;
}

/// The full bus: publisher and subscriber sides together.
pub trait EventBus: EventPublisher + EventSubscriber {}

impl<T: EventPublisher + EventSubscriber> EventBus for T {}
