use super::provider_error::ProviderError;
use crate::domain::podcast::Voice;
use async_trait::async_trait;

/// Repository for speech synthesis.
/// Abstracts the underlying TTS provider (ElevenLabs today).
#[async_trait]
pub trait VoiceRepository: Send + Sync {
    /// List the voices available to the account
    async fn list_voices(&self) -> Result<Vec<Voice>, ProviderError>;

    /// Synthesize one utterance with the given voice.
    ///
    /// Returns MP3 audio data.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ProviderError>;
}
