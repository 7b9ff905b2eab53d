// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert lifecycle orchestration for the Vigil alerting service.
//!
//! [`AlertService`] is the single entry point for lifecycle commands; the
//! consumer, handlers, dead-letter processor, and workers form the
//! downstream processing plane fed by the event bus.

pub mod consumer;
pub mod dlq;
pub mod handlers;
pub mod notification;
pub mod producer;
pub mod service;
pub mod webhook;
pub mod worker;

pub use consumer::{AlertConsumer, AlertLifecycleHandler};
pub use dlq::{DeadLetterProcessor, FailedEvent, FailedEventStatus};
pub use notification::{NotificationService, ResilientNotifier};
pub use producer::AlertEventProducer;
pub use service::{AlertService, CreateAlertInput, ListInput};
pub use webhook::WebhookNotifier;
pub use worker::{EventWorker, ExpirationSweeper};
