pub mod assembly;
pub mod error;
pub mod model;
pub mod processor;
pub mod retry;
pub mod script;
pub mod service;
pub mod speakers;
pub mod summary;

use chrono::{DateTime, Utc};
pub use error::PodcastServiceError;
pub use model::*;
pub use processor::{JobMessage, JobProcessor, ProcessorSettings};
pub use retry::RetryPolicy;
use serde::{Deserialize, Serialize};
pub use service::{DocumentUpload, PodcastService, PodcastServiceApi};

/// Response for POST /upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: JobId,
}

/// Response for GET /status/:job_id and POST /cancel/:job_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: JobId,
    pub state: JobState,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utterance_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<SpeakerView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerView {
    pub name: String,
    pub role: SpeakerRole,
    pub voice_name: String,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            state: job.state,
            progress: job.progress,
            message: job.message.clone(),
            error: job.error.as_ref().map(|e| e.message.clone()),
            error_kind: job.error.as_ref().map(|e| e.kind),
            download_url: job
                .result
                .as_ref()
                .map(|a| format!("/download/{}", a.filename)),
            filename: job.result.as_ref().map(|a| a.filename.clone()),
            utterance_count: job.result.as_ref().map(|a| a.utterance_count),
            speakers: job
                .speakers
                .iter()
                .map(|s| SpeakerView {
                    name: s.name.clone(),
                    role: s.role,
                    voice_name: s.voice.name.clone(),
                })
                .collect(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// A finished podcast file
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Response for GET /health/ready
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub queue_accepting: bool,
    pub output_dir_ready: bool,
    pub tracked_jobs: u64,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.queue_accepting && self.output_dir_ready
    }
}
