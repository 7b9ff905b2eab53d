// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vigil alerting service.
//!
//! This crate provides the domain entities, value objects, event framing,
//! error type, and the trait seams implemented by the backend crates.

pub mod alert;
pub mod error;
pub mod event;
pub mod rule;
pub mod traits;
pub mod user;
pub mod valueobject;

// Re-export key items at crate root for ergonomic imports.
pub use alert::{Alert, AlertSeverity, AlertStatistics, AlertStatus, LifecycleError};
pub use error::VigilError;
pub use event::{Event, EventType};
pub use rule::AlertRule;
pub use user::{User, UserRole};

pub use traits::{
    AlertBroadcaster, AlertStore, EventBus, EventHandler, EventPublisher, EventSubscriber,
    KvStore, NotificationMessage, Notifier,
};
pub use valueobject::{AlertFilter, Email, PaginatedResult, Pagination, PasswordHash};

/// Cache key for the aggregated alert statistics.
pub const STATS_CACHE_KEY: &str = "stats:alerts";

/// Key prefix for stored dead-letter records.
pub const FAILED_EVENT_KEY_PREFIX: &str = "failed_event:";

/// Key of the bounded dead-letter index list.
pub const FAILED_EVENTS_INDEX_KEY: &str = "failed_events:index";
