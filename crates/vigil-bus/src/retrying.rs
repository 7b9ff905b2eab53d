// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrying wrapper around an event bus.
//!
//! Publishes go through the [`Retrier`]; `subscribe` is passed through
//! untouched because the consumer loop is itself the retry mechanism.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use vigil_core::event::Event;
use vigil_core::{EventBus, EventHandler, EventPublisher, EventSubscriber, VigilError};
use vigil_resilience::{Retrier, RetryPolicy};

/// An [`EventBus`] whose publishes retry with exponential backoff.
pub struct RetryingBus<B> {
    inner: Arc<B>,
    retrier: Retrier,
    cancel: CancellationToken,
}

impl<B: EventBus> RetryingBus<B> {
    /// Wrap `inner` with the given policy. `cancel` aborts in-flight backoff
    /// sleeps at shutdown.
    pub fn new(inner: Arc<B>, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            inner,
            retrier: Retrier::new(policy),
            cancel,
        }
    }

    pub fn inner(&self) -> &Arc<B> {
        &self.inner
    }
}

#[async_trait]
impl<B: EventBus> EventPublisher for RetryingBus<B> {
    async fn publish(&self, event: &Event) -> Result<(), VigilError> {
        self.retrier
            .run("publish_event", &self.cancel, || self.inner.publish(event))
            .await
    }

    async fn publish_to_stream(&self, stream: &str, event: &Event) -> Result<(), VigilError> {
        self.retrier
            .run("publish_to_stream", &self.cancel, || {
                self.inner.publish_to_stream(stream, event)
            })
            .await
    }
}

#[async_trait]
impl<B: EventBus> EventSubscriber for RetryingBus<B> {
    async fn subscribe(
        &self,
        stream: &str,
        group: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), VigilError> {
        self.inner.subscribe(stream, group, handler).await
    }

    async fn unsubscribe(&self) -> Result<(), VigilError> {
        self.inner.unsubscribe().await
    }
}
