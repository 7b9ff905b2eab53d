// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the pipeline components.
//!
//! Backends plug in behind these traits: the SQLite store, the in-process
//! KV, the stream bus, the hub broadcaster, and the notification sinks.

pub mod broadcast;
pub mod bus;
pub mod kv;
pub mod notify;
pub mod store;

pub use broadcast::AlertBroadcaster;
pub use bus::{EventBus, EventHandler, EventPublisher, EventSubscriber};
pub use kv::KvStore;
pub use notify::{Notifier, NotificationMessage};
pub use store::AlertStore;
