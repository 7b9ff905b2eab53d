// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process key-value cache for the Vigil alerting service.
//!
//! Backs the statistics cache, the dead-letter records and index, and the
//! rate-limit counters. Values carry an optional per-key TTL.

pub mod memory;

pub use memory::MemoryKv;
