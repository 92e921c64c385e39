use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::answer::{AnswerService, AnswerState};
use crate::document::{DocumentLoader, TextExtractor};
use crate::error::PdfAskError;
use crate::model_gateway::ModelGateway;
use crate::ui::Terminal;

const BUSY_MESSAGE: &str = "Reading the document and preparing your answer...";

/// Runs one question through the service with the spinner up, then renders
/// the outcome. Returns the terminal state reached.
pub async fn ask<G>(
    ui: &Terminal,
    service: &AnswerService<G>,
    document_text: &str,
    question: &str,
) -> (AnswerState, Result<String, PdfAskError>)
where
    G: ModelGateway,
{
    debug!(state = AnswerState::Validating.as_str(), "question submitted");
    let result = if question.trim().is_empty() {
        service.answer(document_text, question).await
    } else {
        debug!(state = AnswerState::Calling.as_str(), "calling model");
        ui.busy(BUSY_MESSAGE, service.answer(document_text, question))
            .await
    };

    let state = AnswerState::after(&result);
    match &result {
        Ok(text) => ui.answer(text),
        Err(err @ PdfAskError::EmptyQuestion) => ui.warning(&err.to_string()),
        Err(err) => ui.error(&err.to_string()),
    }
    debug!(state = state.as_str(), "question finished");
    (state, result)
}

pub async fn run_repl<E, G>(
    ui: &Terminal,
    loader: &mut DocumentLoader<E>,
    document_path: &Path,
    mut document: Arc<str>,
    service: &AnswerService<G>,
) -> Result<()>
where
    E: TextExtractor,
    G: ModelGateway,
{
    ui.info("Ask your question about the document.");
    ui.info("Type '/help' for commands or 'exit' to quit.");

    loop {
        let Some(input) = ui.read_line("> ")? else {
            break;
        };
        let command = input.trim();

        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            break;
        }
        if command.eq_ignore_ascii_case("/help") {
            print_help(ui);
            continue;
        }
        if command.eq_ignore_ascii_case("/reload") {
            loader.clear();
            match loader.load(document_path) {
                Ok(text) => {
                    document = text;
                    ui.info("document reloaded");
                    continue;
                }
                Err(err) => {
                    ui.error(&err.to_string());
                    ui.warning("the document could not be loaded; stopping");
                    break;
                }
            }
        }

        let _ = ask(ui, service, &document, &input).await;
        debug!(state = AnswerState::Idle.as_str(), "ready for next question");
    }

    Ok(())
}

fn print_help(ui: &Terminal) {
    ui.info("commands:");
    ui.info("  /reload  re-read the document from disk");
    ui.info("  /help    show this list");
    ui.info("  exit     leave the session");
}
