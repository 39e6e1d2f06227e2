use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use studysauce_backend::domain::podcast::Voice;
use studysauce_backend::infrastructure::repositories::{
    ContentRepository, DocumentRepository, ProviderError, VoiceRepository,
};
use tokio::sync::Notify;

/// Smallest MP3-looking payload: an empty ID3v2.3 tag followed by a frame header
pub const FAKE_MP3: [u8; 14] = [
    b'I', b'D', b'3', 3, 0, 0, 0, 0, 0, 0, 0xFF, 0xFB, 0x90, 0x64,
];

pub const SCRIPT: &str = "**StudySauce**\n\
    Alex: Hey everyone, welcome to StudySauce!\n\
    Taylor: Today we are talking about how cells divide.\n\
    Alex: Mitosis splits one cell into two identical cells.\n\
    Taylor: Thanks for listening!";

/// Treats any upload starting with `%PDF` as a two page document
pub struct MockDocuments;

#[async_trait]
impl DocumentRepository for MockDocuments {
    async fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, String> {
        if !data.starts_with(b"%PDF") {
            return Err("failed to parse PDF: missing header".to_string());
        }
        Ok(vec![
            "Mitosis is the process by which a single eukaryotic cell divides into two.".to_string(),
            "Prophase, metaphase, anaphase and telophase make up the phases of mitosis.".to_string(),
        ])
    }
}

pub enum ContentBehavior {
    Scripted,
    Timeout,
    /// Block every call until the job is cancelled
    Hang,
}

pub struct MockContent {
    behavior: ContentBehavior,
    calls: AtomicU32,
    never: Notify,
}

impl MockContent {
    pub fn new(behavior: ContentBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicU32::new(0),
            never: Notify::new(),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentRepository for MockContent {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ContentBehavior::Scripted => {
                if prompt.starts_with("Generate a conversational podcast script") {
                    Ok(SCRIPT.to_string())
                } else {
                    Ok("Cells divide through the four phases of mitosis.".to_string())
                }
            }
            ContentBehavior::Timeout => Err(ProviderError::Timeout),
            ContentBehavior::Hang => {
                self.never.notified().await;
                Err(ProviderError::Timeout)
            }
        }
    }
}

pub struct MockVoices {
    fail: bool,
}

impl MockVoices {
    pub fn working() -> Arc<Self> {
        Arc::new(Self { fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true })
    }
}

#[async_trait]
impl VoiceRepository for MockVoices {
    async fn list_voices(&self) -> Result<Vec<Voice>, ProviderError> {
        Ok(vec![
            Voice {
                voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
                name: "Rachel".to_string(),
            },
            Voice {
                voice_id: "AZnzlk1XvdvUeBnXmlld".to_string(),
                name: "Domi".to_string(),
            },
        ])
    }

    async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Permanent {
                status: 401,
                message: "invalid api key".to_string(),
            });
        }
        Ok(FAKE_MP3.to_vec())
    }
}
