//! Credential lookup.
//!
//! Model entries only name their credential (`credential_key`); the secret
//! is resolved lazily through a [`CredentialSource`] right before a provider
//! is connected. A missing secret is a configuration error, never a default.

use std::collections::HashMap;

/// Process-wide key → secret lookup.
pub trait CredentialSource: Send + Sync {
    /// Return the secret stored under `key`, if any. Empty values count as
    /// absent.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// A fixed in-memory credential table.
#[derive(Default, Clone)]
pub struct StaticCredentials {
    secrets: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), secret.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        self.secrets
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("keys", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Inline config credentials first, then the environment.
#[derive(Debug, Clone)]
pub struct ConfiguredCredentials {
    inline: StaticCredentials,
    env: EnvCredentials,
}

impl ConfiguredCredentials {
    pub fn new(inline: HashMap<String, String>) -> Self {
        Self {
            inline: StaticCredentials { secrets: inline },
            env: EnvCredentials,
        }
    }
}

impl CredentialSource for ConfiguredCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        self.inline.lookup(key).or_else(|| self.env.lookup(key))
    }
}
