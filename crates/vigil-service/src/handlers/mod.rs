// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in alert event handlers registered with the consumer.

pub mod logging;
pub mod metrics;
pub mod notification;

pub use logging::LoggingHandler;
pub use metrics::EventMetricsHandler;
pub use notification::NotificationHandler;
