use super::provider_error::ProviderError;
use super::voice_repository::VoiceRepository;
use crate::domain::podcast::Voice;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ELEVENLABS_DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// ElevenLabs implementation of the voice repository
pub struct ElevenLabsVoiceRepository {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.3,
            similarity_boost: 0.6,
            style: 0.1,
            use_speaker_boost: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VoicesResponse {
    #[serde(default)]
    pub voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceEntry {
    pub voice_id: Option<String>,
    pub name: Option<String>,
}

/// Keep only entries carrying both an id and a name
pub fn usable_voices(response: VoicesResponse) -> Vec<Voice> {
    response
        .voices
        .into_iter()
        .filter_map(|entry| match (entry.voice_id, entry.name) {
            (Some(voice_id), Some(name)) if !voice_id.is_empty() && !name.is_empty() => {
                Some(Voice { voice_id, name })
            }
            _ => None,
        })
        .collect()
}

impl ElevenLabsVoiceRepository {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn speech_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url,
            urlencoding::encode(voice_id),
            OUTPUT_FORMAT
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(status.as_u16(), body))
    }
}

#[async_trait]
impl VoiceRepository for ElevenLabsVoiceRepository {
    async fn list_voices(&self) -> Result<Vec<Voice>, ProviderError> {
        let response = self
            .http_client
            .get(format!("{}/v1/voices", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        let payload: VoicesResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse voices: {}", e)))?;

        let voices = usable_voices(payload);
        tracing::debug!(voice_count = voices.len(), "ElevenLabs voices listed");
        Ok(voices)
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        let start_time = std::time::Instant::now();

        tracing::debug!(
            model = %self.model,
            voice_id = voice_id,
            text_length = text.len(),
            text_preview = %text.chars().take(80).collect::<String>(),
            "Calling ElevenLabs TTS API"
        );

        let request = SpeechRequest {
            text,
            model_id: &self.model,
            voice_settings: VoiceSettings::default(),
        };

        let response = self
            .http_client
            .post(self.speech_url(voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, voice_id = voice_id, "ElevenLabs request failed");
                ProviderError::from_reqwest(&e)
            })?;

        let audio = Self::check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        if audio.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "empty audio returned".to_string(),
            ));
        }

        tracing::info!(
            provider = "elevenlabs",
            model = %self.model,
            voice_id = voice_id,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            audio_size_bytes = audio.len(),
            "TTS synthesis completed"
        );

        Ok(audio.to_vec())
    }
}
