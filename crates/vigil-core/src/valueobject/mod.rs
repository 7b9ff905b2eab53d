// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable value objects: identified by their attributes, validated at
//! construction.

pub mod email;
pub mod filter;
pub mod pagination;
pub mod password;

pub use email::{Email, EmailError};
pub use filter::AlertFilter;
pub use pagination::{PaginatedResult, Pagination};
pub use password::{PasswordError, PasswordHash};
