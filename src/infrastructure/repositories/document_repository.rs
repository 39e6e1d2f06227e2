use async_trait::async_trait;

/// Repository for document text extraction.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Extract raw text per page, in page order.
    ///
    /// # Errors
    /// Returns a description of the failure if the document cannot be
    /// parsed (corrupted, encrypted, not a PDF) or extraction times out.
    async fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, String>;
}
