// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User entity.
//!
//! Authentication lives outside the core; the pipeline consumes only user
//! ids and roles for attribution, but the stored shape is kept here so the
//! persistence layer and the admin surface share one definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::valueobject::{Email, PasswordHash};

/// Access roles, from most to least privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Operator,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserValidationError {
    #[error("user name must be at least 2 characters")]
    NameTooShort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Email,
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: Email,
        password_hash: PasswordHash,
        name: impl Into<String>,
        role: UserRole,
    ) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().len() < 2 {
            return Err(UserValidationError::NameTooShort);
        }

        let now = Utc::now();
        Ok(User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}
