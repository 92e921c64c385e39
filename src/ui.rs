use anyhow::{Context, Result};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tracing::warn;

use crate::credentials::CredentialPrompt;

const TITLE: &str = "Document Assistant";
const CAPTION: &str = "Ask questions about the document and get answers grounded in its content.";
const FOOTER: &str = "Answers are generated by Gemini from the document text only.";

/// Terminal rendering surface: banners, masked input, a busy spinner and the
/// answer area.
#[derive(Debug, Clone)]
pub struct Terminal {
    out: Term,
    err: Term,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    pub fn header(&self) {
        let _ = self.out.write_line(&style(TITLE).bold().to_string());
        let _ = self.out.write_line(&style(CAPTION).dim().to_string());
        let _ = self.out.write_line("");
    }

    pub fn footer(&self) {
        let _ = self.out.write_line("---");
        let _ = self.out.write_line(&style(FOOTER).dim().to_string());
    }

    pub fn info(&self, message: &str) {
        let _ = self
            .out
            .write_line(&format!("{} {}", style("info:").cyan().bold(), message));
    }

    pub fn warning(&self, message: &str) {
        let _ = self
            .err
            .write_line(&format!("{} {}", style("warning:").yellow().bold(), message));
    }

    pub fn error(&self, message: &str) {
        let _ = self
            .err
            .write_line(&format!("{} {}", style("error:").red().bold(), message));
    }

    /// Renders the model's answer as-is; the text is already formatted.
    pub fn answer(&self, text: &str) {
        let _ = self.out.write_line(&answer_block(text));
    }

    /// Reads one line of input. `None` on end of input.
    pub fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read stdin")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Shows a spinner on stderr until `task` finishes. The task is awaited to
    /// completion; there is no way to abandon it.
    pub async fn busy<F, T>(&self, message: &str, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));

        let output = task.await;
        spinner.finish_and_clear();
        output
    }
}

impl CredentialPrompt for Terminal {
    fn prompt_secret(&self, label: &str) -> Option<String> {
        let _ = self.err.write_str(&format!("{label}: "));
        match self.err.read_secure_line() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "could not read API key from terminal");
                None
            }
        }
    }
}

fn answer_block(text: &str) -> String {
    format!("{}\n{}\n", style("Answer:").bold().underlined(), text)
}
