// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Vigil alerting service.
//!
//! TOML files merged with `VIGIL_*` environment overrides via Figment.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::VigilConfig;
