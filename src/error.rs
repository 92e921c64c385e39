use std::path::PathBuf;

use thiserror::Error;

/// Everything a user can be shown. Each variant is produced at the first
/// component able to detect it and rendered immediately; none of them is
/// allowed to escape as a crash.
#[derive(Debug, Error)]
pub enum PdfAskError {
    #[error("no API key available; set the {secret} secret or enter it when prompted")]
    MissingCredential { secret: String },

    #[error("failed to configure the model client: {0}")]
    Configuration(String),

    #[error("file not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("could not read the PDF at {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("please enter a question")]
    EmptyQuestion,

    #[error("an error occurred while generating the answer: {0}")]
    Backend(String),
}

impl PdfAskError {
    /// Whether the session must stop taking questions after this error.
    pub fn is_halting(&self) -> bool {
        !matches!(self, Self::EmptyQuestion | Self::Backend(_))
    }
}
