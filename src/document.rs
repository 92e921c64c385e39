use anyhow::{Context, Result};
use lopdf::Document;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::PdfAskError;

const NO_TEXT_MESSAGE: &str =
    "no text could be extracted; the PDF may contain only scanned images";

pub trait TextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Page-by-page text extraction backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let document = Document::load(path)
            .with_context(|| format!("Failed to open PDF '{}'", path.display()))?;

        // `get_pages` is a BTreeMap keyed by page number, so iteration is in page order.
        let pages = document.get_pages();
        let mut text = String::new();
        for page_number in pages.keys() {
            let page_text = document
                .extract_text(&[*page_number])
                .with_context(|| format!("Failed to extract text from page {page_number}"))?;
            text.push_str(&page_text);
        }

        debug!(
            path = %path.display(),
            page_count = pages.len(),
            text_len = text.len(),
            "extracted PDF text"
        );
        Ok(text)
    }
}

/// Extracts document text once per path and serves every later request from
/// memory. The cache is keyed on the path alone; edits to the file on disk are
/// not noticed until [`DocumentLoader::clear`] is called or the process restarts.
pub struct DocumentLoader<E = PdfTextExtractor> {
    extractor: E,
    cache: HashMap<PathBuf, Arc<str>>,
}

impl DocumentLoader<PdfTextExtractor> {
    pub fn new() -> Self {
        Self::with_extractor(PdfTextExtractor)
    }
}

impl Default for DocumentLoader<PdfTextExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> DocumentLoader<E>
where
    E: TextExtractor,
{
    pub fn with_extractor(extractor: E) -> Self {
        Self {
            extractor,
            cache: HashMap::new(),
        }
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<str>, PdfAskError> {
        if let Some(text) = self.cache.get(path) {
            debug!(path = %path.display(), "document served from cache");
            return Ok(Arc::clone(text));
        }

        if !path.exists() {
            warn!(path = %path.display(), "document not found");
            return Err(PdfAskError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text: Arc<str> = self
            .extractor
            .extract_text(path)
            .map_err(|err| {
                warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "document extraction failed"
                );
                PdfAskError::Extraction {
                    path: path.to_path_buf(),
                    message: format!("{err:#}"),
                }
            })?
            .into();

        if text.trim().is_empty() {
            warn!(path = %path.display(), "document has no extractable text");
            return Err(PdfAskError::Extraction {
                path: path.to_path_buf(),
                message: NO_TEXT_MESSAGE.to_string(),
            });
        }

        info!(path = %path.display(), text_len = text.len(), "document loaded");
        self.cache.insert(path.to_path_buf(), Arc::clone(&text));
        Ok(text)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        debug!(entries = self.cache.len(), "clearing document cache");
        self.cache.clear();
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }
}
