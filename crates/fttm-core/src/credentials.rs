//! Static operator credential table.
//!
//! Entries are `username:sha256hex` pairs where the digest covers the salt
//! followed by the password. Lookups compare digests in constant time.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{ConfigError, CoreError};

/// A successfully logged-in operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub username: String,
}

#[derive(Clone)]
pub struct Credentials {
    digests: HashMap<String, String>,
    salt: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut users: Vec<&String> = self.digests.keys().collect();
        users.sort();
        f.debug_struct("Credentials")
            .field("users", &users)
            .field("salt", &"[redacted]")
            .finish()
    }
}

/// Hex SHA-256 of `salt || password`.
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Credentials {
    /// Parses a comma-separated `username:sha256hex` table.
    ///
    /// Blank entries are skipped; an empty string yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Credentials`] for an entry without a `:`, with
    /// an empty username, or with a digest that is not 64 hex characters.
    pub fn parse(raw: &str, salt: &str) -> Result<Self, ConfigError> {
        let mut digests = HashMap::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (user, digest) = entry.split_once(':').ok_or_else(|| {
                ConfigError::Credentials(format!("expected username:digest, got '{entry}'"))
            })?;
            let user = user.trim();
            let digest = digest.trim().to_ascii_lowercase();

            if user.is_empty() {
                return Err(ConfigError::Credentials(
                    "username must be non-empty".to_string(),
                ));
            }
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Credentials(format!(
                    "digest for '{user}' must be 64 hex characters"
                )));
            }

            digests.insert(user.to_string(), digest);
        }

        Ok(Self {
            digests,
            salt: salt.to_string(),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Checks a username/password pair against the table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LoginFailed`] when the user is unknown or the
    /// password does not match.
    pub fn login(&self, username: &str, password: &str) -> Result<Operator, CoreError> {
        let candidate = hash_password(&self.salt, password);
        let matched = self
            .digests
            .get(username)
            .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(candidate.as_bytes())));

        if matched {
            Ok(Operator {
                username: username.to_string(),
            })
        } else {
            Err(CoreError::LoginFailed(username.to_string()))
        }
    }
}
