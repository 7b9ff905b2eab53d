// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

pub mod admin;
pub mod alerts;
pub mod health;
pub mod webhook;
