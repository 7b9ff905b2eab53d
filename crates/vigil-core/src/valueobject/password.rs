// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password strength policy and hashing.
//!
//! The plain text never leaves this module; callers hold only the
//! Argon2id hash string.

use argon2::password_hash::{rand_core::OsRng, PasswordHash as ParsedHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum password length in bytes.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Maximum password length in bytes.
pub const MAX_PASSWORD_LEN: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password cannot be empty")]
    Empty,
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must be less than 72 characters")]
    TooLong,
    #[error("password must contain at least one uppercase letter")]
    NoUppercase,
    #[error("password must contain at least one lowercase letter")]
    NoLowercase,
    #[error("password must contain at least one number")]
    NoNumber,
    #[error("failed to hash password")]
    HashFailed,
}

/// A securely hashed password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Validate the strength policy, then hash the plain text.
    pub fn new(plain: &str) -> Result<Self, PasswordError> {
        validate_strength(plain)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashFailed)?;
        Ok(PasswordHash(hash.to_string()))
    }

    /// Wrap a previously stored hash without re-validating.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        PasswordHash(hash.into())
    }

    /// Constant-time comparison of a plain text against the stored hash.
    pub fn verify(&self, plain: &str) -> bool {
        let Ok(parsed) = ParsedHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn validate_strength(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(PasswordError::TooLong);
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_number = password.chars().any(|c| c.is_numeric());

    if !has_upper {
        return Err(PasswordError::NoUppercase);
    }
    if !has_lower {
        return Err(PasswordError::NoLowercase);
    }
    if !has_number {
        return Err(PasswordError::NoNumber);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_chars_is_too_short() {
        assert_eq!(
            PasswordHash::new("Abc123x").unwrap_err(),
            PasswordError::TooShort
        );
    }

    #[test]
    fn seventy_three_chars_is_too_long() {
        let password = format!("Aa1{}", "x".repeat(70));
        assert_eq!(password.len(), 73);
        assert_eq!(
            PasswordHash::new(&password).unwrap_err(),
            PasswordError::TooLong
        );
    }

    #[test]
    fn seventy_two_chars_with_classes_is_accepted() {
        let password = format!("Aa1{}", "x".repeat(69));
        assert_eq!(password.len(), 72);
        assert!(PasswordHash::new(&password).is_ok());
    }

    #[test]
    fn requires_all_character_classes() {
        assert_eq!(
            PasswordHash::new("alllowercase1").unwrap_err(),
            PasswordError::NoUppercase
        );
        assert_eq!(
            PasswordHash::new("ALLUPPERCASE1").unwrap_err(),
            PasswordError::NoLowercase
        );
        assert_eq!(
            PasswordHash::new("NoNumbersHere").unwrap_err(),
            PasswordError::NoNumber
        );
    }

    #[test]
    fn verify_round_trip() {
        let hash = PasswordHash::new("Sup3rSecret").unwrap();
        assert!(hash.verify("Sup3rSecret"));
        assert!(!hash.verify("Sup3rSecret!"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn from_hash_does_not_validate() {
        let hash = PasswordHash::from_hash("$argon2id$bogus");
        assert!(!hash.verify("anything"));
    }
}
