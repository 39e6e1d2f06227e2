pub mod artifact_repository;
pub mod content_repository;
pub mod document_repository;
pub mod elevenlabs_voice_repository;
pub mod gemini_content_repository;
pub mod job_repository;
pub mod pdf_document_repository;
pub mod provider_error;
pub mod voice_repository;

pub use artifact_repository::ArtifactRepository;
pub use content_repository::ContentRepository;
pub use document_repository::DocumentRepository;
pub use elevenlabs_voice_repository::ElevenLabsVoiceRepository;
pub use gemini_content_repository::GeminiContentRepository;
pub use job_repository::{JobRecord, JobRepository};
pub use pdf_document_repository::PdfDocumentRepository;
pub use provider_error::ProviderError;
pub use voice_repository::VoiceRepository;
