// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable event bus for the Vigil alerting service.
//!
//! Streams are append-only SQLite tables with consumer-group cursors and a
//! pending set for explicit acknowledgment. Consumer loops deliver each
//! event to one consumer per group with capped retries and a dead-letter
//! overflow.

pub mod bus;
pub mod retrying;
pub mod store;

pub use bus::{StreamBus, StreamBusConfig};
pub use retrying::RetryingBus;
pub use store::{StreamEntry, StreamStore};
