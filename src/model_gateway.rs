use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::info;

use crate::config::Config;
use crate::credentials::Credential;
use crate::error::PdfAskError;
use crate::model;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayResponse {
    pub text: String,
}

pub type ModelGatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelGatewayResponse>> + 'a>>;

/// The language-model backend as seen by the answer service.
pub trait ModelGateway {
    fn generate<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a>;
}

type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

trait GenerateBackend {
    fn generate<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        credential: &'a Credential,
        prompt: &'a str,
    ) -> GenerateFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderGenerateBackend;

impl GenerateBackend for ProviderGenerateBackend {
    fn generate<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        credential: &'a Credential,
        prompt: &'a str,
    ) -> GenerateFuture<'a> {
        Box::pin(async move { model::generate(client, cfg, credential, prompt).await })
    }
}

/// Gateway bound to one HTTP client, one configuration and one API key for
/// the whole session.
pub struct HostModelGateway<'a, B = ProviderGenerateBackend> {
    client: &'a Client,
    cfg: &'a Config,
    credential: Credential,
    backend: B,
}

impl<'a> HostModelGateway<'a, ProviderGenerateBackend> {
    /// Configures the backend client. Unsupported providers and malformed keys
    /// are configuration errors.
    pub fn connect(
        client: &'a Client,
        cfg: &'a Config,
        credential: Credential,
    ) -> Result<Self, PdfAskError> {
        model::ensure_supported_provider(&cfg.model_provider)
            .map_err(|err| PdfAskError::Configuration(format!("{err:#}")))?;
        validate_api_key(&credential)?;

        info!(
            provider = %cfg.model_provider,
            model = %cfg.model,
            "model client configured"
        );
        Ok(Self::with_backend(
            client,
            cfg,
            credential,
            ProviderGenerateBackend,
        ))
    }
}

impl<'a, B> HostModelGateway<'a, B> {
    fn with_backend(
        client: &'a Client,
        cfg: &'a Config,
        credential: Credential,
        backend: B,
    ) -> Self {
        Self {
            client,
            cfg,
            credential,
            backend,
        }
    }
}

fn validate_api_key(credential: &Credential) -> Result<(), PdfAskError> {
    let key = credential.expose();
    if key.is_empty() {
        return Err(PdfAskError::Configuration("API key is empty".to_string()));
    }
    if !key.chars().all(|ch| ch.is_ascii_graphic()) {
        return Err(PdfAskError::Configuration(
            "API key contains whitespace or non-printable characters".to_string(),
        ));
    }
    Ok(())
}

impl<'a, B> ModelGateway for HostModelGateway<'a, B>
where
    B: GenerateBackend,
{
    fn generate<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            let text = self
                .backend
                .generate(self.client, self.cfg, &self.credential, &request.prompt)
                .await?;
            Ok(ModelGatewayResponse { text })
        })
    }
}
