// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Vigil alerting service.
//!
//! WAL-mode SQLite with embedded refinery migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query modules for
//! alerts and alert rules. Backend errors are translated to the domain
//! taxonomy at this boundary.

pub mod adapter;
pub mod database;
pub mod models;
pub mod queries;

pub use adapter::SqliteAlertStore;
pub use database::Database;
