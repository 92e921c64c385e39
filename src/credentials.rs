use std::env;
use std::fmt;

use tracing::{debug, info};

use crate::error::PdfAskError;

/// API key held in memory for the session. Never printed, never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

pub trait SecretStore {
    fn get(&self, name: &str) -> Option<String>;
}

pub trait CredentialPrompt {
    /// Asks the user for a secret with masked input. `None` when the user
    /// gives nothing or input is unavailable.
    fn prompt_secret(&self, label: &str) -> Option<String>;
}

/// Secrets read from the process environment (after `.env` has been merged in).
pub struct EnvSecretStore<F = fn(&str) -> Option<String>> {
    lookup: F,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self {
            lookup: |name| env::var(name).ok(),
        }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> EnvSecretStore<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> SecretStore for EnvSecretStore<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }
}

fn usable(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves the API key from the store, falling back to an interactive prompt.
pub fn resolve(
    secret_name: &str,
    store: &impl SecretStore,
    prompt: &impl CredentialPrompt,
) -> Result<Credential, PdfAskError> {
    if let Some(value) = usable(store.get(secret_name)) {
        debug!(secret = %secret_name, "API key found in secret store");
        return Ok(Credential::new(value));
    }

    info!(secret = %secret_name, "API key not in secret store; asking interactively");
    let label = format!("Your {secret_name}");
    usable(prompt.prompt_secret(&label))
        .map(Credential::new)
        .ok_or_else(|| PdfAskError::MissingCredential {
            secret: secret_name.to_string(),
        })
}
