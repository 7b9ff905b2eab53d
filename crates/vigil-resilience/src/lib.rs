// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the Vigil alerting service: bounded retries
//! with exponential backoff, and per-sink circuit breakers.

pub mod breaker;
pub mod retry;

pub use breaker::{
    BreakerConfig, BreakerDefaults, BreakerRegistry, BreakerState, BreakerStats, CircuitBreaker,
};
pub use retry::{Retrier, RetryPolicy};
