use super::provider_error::ProviderError;
use async_trait::async_trait;

/// Repository for text generation.
/// Abstracts the underlying LLM provider (Gemini today).
///
/// One call is one request to the provider: retries and prompt splitting
/// are decided by the caller from the returned [`ProviderError`].
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Run a single prompt and return the generated text, trimmed
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
