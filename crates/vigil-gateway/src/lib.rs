// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Vigil alerting service.
//!
//! Serves the REST surface, the AlertManager webhook intake, the admin
//! endpoints over the DLQ and circuit breakers, and the `/ws` upgrade with
//! the hub client pumps. Authentication, rate limiting, and role checks are
//! the front proxy's concern; actor attribution arrives via `X-User-Id`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use server::{router, start_server, AppState};
