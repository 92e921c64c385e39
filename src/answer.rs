use tracing::{debug, warn};

use crate::error::PdfAskError;
use crate::model_gateway::{ModelGateway, ModelGatewayRequest};
use crate::prompt::build_prompt;

/// Where a single question is in its lifecycle. Every terminal state goes back
/// to `Idle` on the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Idle,
    Validating,
    Calling,
    Rendered,
    Warned,
    ErrorShown,
}

impl AnswerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Calling => "calling",
            Self::Rendered => "rendered",
            Self::Warned => "warned",
            Self::ErrorShown => "error_shown",
        }
    }

    /// Terminal state reached for a finished request.
    pub fn after(result: &Result<String, PdfAskError>) -> Self {
        match result {
            Ok(_) => Self::Rendered,
            Err(PdfAskError::EmptyQuestion) => Self::Warned,
            Err(_) => Self::ErrorShown,
        }
    }
}

pub struct AnswerService<G> {
    gateway: G,
}

impl<G> AnswerService<G>
where
    G: ModelGateway,
{
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Blank questions are rejected before the backend is touched. Backend
    /// failures come back as [`PdfAskError::Backend`]; nothing is retried.
    pub async fn answer(
        &self,
        document_text: &str,
        question: &str,
    ) -> Result<String, PdfAskError> {
        if question.trim().is_empty() {
            debug!("rejecting empty question");
            return Err(PdfAskError::EmptyQuestion);
        }

        let prompt = build_prompt(document_text, question);
        debug!(
            document_len = document_text.len(),
            question_len = question.len(),
            prompt_len = prompt.len(),
            "requesting answer"
        );

        match self.gateway.generate(ModelGatewayRequest { prompt }).await {
            Ok(response) => {
                debug!(answer_len = response.text.len(), "answer received");
                Ok(response.text)
            }
            Err(err) => {
                let detail = format!("{err:#}");
                warn!(error = %detail, "answer generation failed");
                Err(PdfAskError::Backend(detail))
            }
        }
    }
}
