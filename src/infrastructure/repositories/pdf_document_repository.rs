use super::document_repository::DocumentRepository;
use async_trait::async_trait;
use pdf_oxide::PdfDocument;
use std::io::Write;
use std::time::Duration;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// PDF text extraction backed by `pdf_oxide`
#[derive(Default)]
pub struct PdfDocumentRepository;

impl PdfDocumentRepository {
    pub fn new() -> Self {
        Self
    }

    fn extract_from_path(path: &std::path::Path) -> Result<Vec<String>, String> {
        let mut doc = PdfDocument::open(path).map_err(|e| format!("failed to parse PDF: {e}"))?;

        let page_count = doc
            .page_count()
            .map_err(|e| format!("failed to read page count: {e}"))?;

        let mut pages = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            // A page that fails to decode is kept as blank so page numbers stay aligned
            pages.push(doc.extract_text(page_index).unwrap_or_default());
        }

        Ok(pages)
    }
}

#[async_trait]
impl DocumentRepository for PdfDocumentRepository {
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    async fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, String> {
        let mut temp_file = tempfile::NamedTempFile::new()
            .map_err(|e| format!("failed to create temp file: {e}"))?;
        temp_file
            .write_all(data)
            .map_err(|e| format!("failed to write temp file: {e}"))?;

        let pages = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || {
                let pages = Self::extract_from_path(temp_file.path());
                drop(temp_file);
                pages
            }),
        )
        .await
        .map_err(|_| "PDF extraction timed out".to_string())?
        .map_err(|e| format!("extraction task failed: {e}"))??;

        tracing::info!(page_count = pages.len(), "PDF text extraction complete");

        Ok(pages)
    }
}
