pub mod answer;
pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod prompt;
pub mod providers;
pub mod repl;
pub mod ui;

use anyhow::{Result, anyhow};
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::info;

use answer::AnswerService;
use config::Config;
use credentials::EnvSecretStore;
use document::DocumentLoader;
use error::PdfAskError;
use model_gateway::HostModelGateway;
use repl::{ask, run_repl};
use ui::Terminal;

fn build_client(cfg: &Config) -> Result<Client, PdfAskError> {
    let mut builder = Client::builder();
    if let Some(secs) = cfg.model_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|err| {
        PdfAskError::Configuration(format!("Failed to initialize HTTP client: {err}"))
    })
}

/// Entry point behind the binary. Halting conditions (no key, bad client
/// configuration, unreadable document) are shown to the user and end the
/// session with `Ok(())`; only a failed one-shot question is an `Err`.
pub async fn run() -> Result<()> {
    let cfg = Config::from_env();
    info!(
        provider = %cfg.model_provider,
        model = %cfg.model,
        document_path = %cfg.document_path.display(),
        timeout_secs = ?cfg.model_timeout_secs,
        "loaded runtime configuration"
    );

    let ui = Terminal::new();
    ui.header();

    let credential =
        match credentials::resolve(&cfg.api_key_secret, &EnvSecretStore::new(), &ui) {
            Ok(credential) => credential,
            Err(err) => {
                ui.info(&err.to_string());
                return Ok(());
            }
        };

    let client = match build_client(&cfg) {
        Ok(client) => client,
        Err(err) => {
            ui.error(&err.to_string());
            return Ok(());
        }
    };
    let gateway = match HostModelGateway::connect(&client, &cfg, credential) {
        Ok(gateway) => gateway,
        Err(err) => {
            ui.error(&err.to_string());
            return Ok(());
        }
    };
    let service = AnswerService::new(gateway);

    let mut loader = DocumentLoader::new();
    let document = match loader.load(&cfg.document_path) {
        Ok(text) => text,
        Err(err) => {
            ui.error(&err.to_string());
            ui.warning(
                "the document could not be loaded; \
                 check the file name and that it is in the right folder",
            );
            return Ok(());
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        run_repl(&ui, &mut loader, &cfg.document_path, document, &service).await?;
        ui.footer();
        return Ok(());
    }

    let question = args.join(" ");
    let (_, result) = ask(&ui, &service, &document, &question).await;
    ui.footer();
    match result {
        Err(err @ PdfAskError::Backend(_)) => Err(anyhow!(err)),
        _ => Ok(()),
    }
}
