// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time broadcast plane for the Vigil alerting service.
//!
//! A single coordinator loop maintains the client registry; each client has
//! a bounded outbound buffer and is dropped when it cannot keep up. The
//! socket pumps live in the gateway crate; this crate is transport-free.

pub mod client;
pub mod hub;
pub mod message;
pub mod publisher;

pub use client::{Client, ClientReceiver};
pub use hub::Hub;
pub use message::{MessageType, WsMessage};
pub use publisher::HubBroadcaster;
