//! API key lookup.

use std::env::VarError;
use std::fmt;

use anyhow::bail;

/// Environment variables searched for the OpenAI key, most specific first.
pub const API_KEY_VARS: [&str; 2] = ["NEWSROOM_OPENAI_API_KEY", "OPENAI_API_KEY"];

/// An API key whose `Debug` output never shows the value.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Source of credentials for the model endpoint.
pub trait VaultProvider: Send + Sync {
    /// `Ok(None)` when `key` is unset or blank.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend holds a value it cannot read.
    fn get_secret(&self, key: &str) -> anyhow::Result<Option<Secret>>;

    /// First of `keys` that has a value.
    ///
    /// # Errors
    ///
    /// Stops at the first backend error.
    fn first_of(&self, keys: &[&str]) -> anyhow::Result<Option<Secret>> {
        for &key in keys {
            if let Some(secret) = self.get_secret(key)? {
                tracing::debug!(key, "API key found");
                return Ok(Some(secret));
            }
        }
        Ok(None)
    }
}

/// Reads process environment variables. Surrounding whitespace is trimmed.
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(&self, key: &str) -> anyhow::Result<Option<Secret>> {
        match std::env::var(key) {
            Ok(v) if v.trim().is_empty() => Ok(None),
            Ok(v) => Ok(Some(Secret::new(v.trim()))),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => bail!("{key} is not valid UTF-8"),
        }
    }
}
