// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breakers for external notification sinks.
//!
//! Three states: `closed` (calls pass through, consecutive failures are
//! counted), `open` (calls rejected without reaching the sink until the
//! timeout elapses), `half-open` (a bounded number of trial calls probe the
//! sink; any failure reopens, enough successes close).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use vigil_core::VigilError;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        })
    }
}

/// Per-breaker configuration.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub name: String,
    pub max_failures: u32,
    pub timeout: Duration,
    pub half_open_requests: u32,
}

impl BreakerConfig {
    pub fn default_for(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_failures: 5,
            timeout: Duration::from_secs(30),
            half_open_requests: 3,
        }
    }
}

/// Point-in-time snapshot of a breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    pub name: String,
    pub state: String,
    pub failures: u32,
    pub successes: u32,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failures: u32,
    successes: u32,
    half_open_requests: u32,
    last_failure: Option<Instant>,
}

/// A single circuit breaker.
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: RwLock<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(BreakerInner {
                state: BreakerState::Closed,
                failures: 0,
                successes: 0,
                half_open_requests: 0,
                last_failure: None,
            }),
        }
    }

    /// Execute `op` with breaker protection.
    ///
    /// In the open state the call is rejected with
    /// [`VigilError::CircuitOpen`] without reaching the sink; rejections are
    /// not counted as call failures.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, VigilError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, VigilError>>,
    {
        if !self.try_acquire() {
            warn!(
                circuit = self.config.name.as_str(),
                state = %self.state(),
                "circuit breaker rejected request"
            );
            return Err(VigilError::CircuitOpen {
                name: self.config.name.clone(),
            });
        }

        let result = op().await;
        self.record_result(result.is_ok());
        result
    }

    /// Whether the breaker currently admits a call, claiming a half-open
    /// slot when applicable.
    fn try_acquire(&self) -> bool {
        let mut inner = self.inner.write().expect("breaker lock poisoned");

        match inner.state {
            BreakerState::Closed => true,

            BreakerState::Open => {
                let expired = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() > self.config.timeout);
                if expired {
                    Self::transition(&mut inner, BreakerState::HalfOpen, &self.config.name);
                    inner.half_open_requests = 1;
                    true
                } else {
                    false
                }
            }

            BreakerState::HalfOpen => {
                if inner.half_open_requests < self.config.half_open_requests {
                    inner.half_open_requests += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_result(&self, success: bool) {
        let mut inner = self.inner.write().expect("breaker lock poisoned");
        if success {
            self.on_success(&mut inner);
        } else {
            self.on_failure(&mut inner);
        }
    }

    fn on_failure(&self, inner: &mut BreakerInner) {
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());

        match inner.state {
            BreakerState::Closed => {
                if inner.failures >= self.config.max_failures {
                    Self::transition(inner, BreakerState::Open, &self.config.name);
                }
            }
            BreakerState::HalfOpen => {
                Self::transition(inner, BreakerState::Open, &self.config.name);
            }
            BreakerState::Open => {}
        }
    }

    fn on_success(&self, inner: &mut BreakerInner) {
        match inner.state {
            BreakerState::Closed => {
                inner.failures = 0;
            }
            BreakerState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.half_open_requests {
                    Self::transition(inner, BreakerState::Closed, &self.config.name);
                }
            }
            BreakerState::Open => {}
        }
    }

    fn transition(inner: &mut BreakerInner, to: BreakerState, name: &str) {
        match to {
            BreakerState::Open => {
                warn!(circuit = name, failures = inner.failures, "circuit breaker opened");
            }
            BreakerState::HalfOpen => {
                info!(circuit = name, "circuit breaker half-opened");
                inner.failures = 0;
            }
            BreakerState::Closed => {
                info!(circuit = name, "circuit breaker closed");
                inner.failures = 0;
            }
        }
        inner.state = to;
        inner.successes = 0;
        if to != BreakerState::HalfOpen {
            inner.half_open_requests = 0;
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.read().expect("breaker lock poisoned").state
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.inner.read().expect("breaker lock poisoned");
        BreakerStats {
            name: self.config.name.clone(),
            state: inner.state.to_string(),
            failures: inner.failures,
            successes: inner.successes,
        }
    }
}

/// Name-keyed access to circuit breakers, creating them on first use.
pub struct BreakerRegistry {
    defaults: BreakerDefaults,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

/// Defaults applied to breakers created by the registry.
#[derive(Debug, Clone)]
pub struct BreakerDefaults {
    pub max_failures: u32,
    pub timeout: Duration,
    pub half_open_requests: u32,
}

impl Default for BreakerDefaults {
    fn default() -> Self {
        Self {
            max_failures: 5,
            timeout: Duration::from_secs(30),
            half_open_requests: 3,
        }
    }
}

impl BreakerRegistry {
    pub fn new(defaults: BreakerDefaults) -> Self {
        Self {
            defaults,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create a breaker by name with the registry defaults.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_with_config(BreakerConfig {
            name: name.to_string(),
            max_failures: self.defaults.max_failures,
            timeout: self.defaults.timeout,
            half_open_requests: self.defaults.half_open_requests,
        })
    }

    /// Get or create a breaker with an explicit config.
    pub fn get_with_config(&self, config: BreakerConfig) -> Arc<CircuitBreaker> {
        {
            let breakers = self.breakers.read().expect("registry lock poisoned");
            if let Some(breaker) = breakers.get(&config.name) {
                return Arc::clone(breaker);
            }
        }

        let mut breakers = self.breakers.write().expect("registry lock poisoned");
        // Double-check after acquiring the write lock.
        if let Some(breaker) = breakers.get(&config.name) {
            return Arc::clone(breaker);
        }

        let breaker = Arc::new(CircuitBreaker::new(config.clone()));
        breakers.insert(config.name, Arc::clone(&breaker));
        breaker
    }

    /// Snapshot of every breaker, keyed by name.
    pub fn stats(&self) -> BTreeMap<String, BreakerStats> {
        let breakers = self.breakers.read().expect("registry lock poisoned");
        breakers
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.stats()))
            .collect()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerDefaults::default())
    }
}
