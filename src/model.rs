use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::credentials::Credential;
use crate::providers;

pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

pub fn ensure_supported_provider(provider: &str) -> Result<()> {
    let provider = provider.to_ascii_lowercase();
    if SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
        return Ok(());
    }

    warn!(provider = %provider, "unsupported model provider configured");
    Err(anyhow!(
        "Unsupported MODEL_PROVIDER='{}'. Supported providers: {}.",
        provider,
        SUPPORTED_PROVIDERS.join(", ")
    ))
}

pub async fn generate(
    client: &Client,
    cfg: &Config,
    credential: &Credential,
    prompt: &str,
) -> Result<String> {
    ensure_supported_provider(&cfg.model_provider)?;
    debug!(
        provider = %cfg.model_provider,
        model = %cfg.model,
        prompt_len = prompt.len(),
        "dispatching model generate request"
    );
    providers::gemini::generate(client, cfg, credential, prompt).await
}
