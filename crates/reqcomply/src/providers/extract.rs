//! Text extraction from stored regulation documents
//!
//! Extraction is best effort: a document that cannot be read yields an empty
//! string rather than an error, and the analysis runs with whatever text it gets.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

/// Trait for turning document bytes into plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text, returning an empty string on failure
    async fn extract_text(&self, data: &[u8]) -> String;
}

/// PDF extractor running pdf-extract on the blocking pool
pub struct PdfTextExtractor {
    timeout: Duration,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, data: &[u8]) -> String {
        let data_vec = data.to_vec();
        let task = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&data_vec)
        });

        match timeout(self.timeout, task).await {
            Ok(Ok(Ok(text))) => clean_text(&text),
            Ok(Ok(Err(e))) => {
                tracing::warn!("pdf-extract failed: {}", e);
                String::new()
            }
            Ok(Err(e)) => {
                // pdf-extract panics on some malformed font tables
                tracing::warn!("PDF extraction task aborted: {}", e);
                String::new()
            }
            Err(_) => {
                tracing::error!("PDF extraction timeout after {:?}", self.timeout);
                String::new()
            }
        }
    }
}

/// UTF-8 passthrough extractor for plain text documents
#[derive(Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_text(&self, data: &[u8]) -> String {
        clean_text(&String::from_utf8_lossy(data))
    }
}

/// Drop NUL bytes, trim lines and remove blank ones
pub fn clean_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
