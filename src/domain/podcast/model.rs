use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PodcastServiceError;

pub const MIN_HOSTS: i64 = 1;
pub const MAX_HOSTS: i64 = 4;
pub const MIN_GUESTS: i64 = 0;
pub const MAX_GUESTS: i64 = 3;
pub const MIN_DURATION_MINUTES: i64 = 3;
pub const MAX_DURATION_MINUTES: i64 = 15;

pub const DEFAULT_HOSTS: i64 = 2;
pub const DEFAULT_GUESTS: i64 = 1;
pub const DEFAULT_DURATION_MINUTES: i64 = 10;

/// Average speaking rate used to size the script
pub const WORDS_PER_MINUTE: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, used in artifact filenames
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Extracting,
    Scripting,
    Synthesizing,
    Assembling,
    Done,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "Queued",
            JobState::Extracting => "Extracting",
            JobState::Scripting => "Scripting",
            JobState::Synthesizing => "Synthesizing",
            JobState::Assembling => "Assembling",
            JobState::Done => "Done",
            JobState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }

    /// Position along the happy path. `Failed` sits outside it.
    fn position(&self) -> Option<u8> {
        match self {
            JobState::Queued => Some(0),
            JobState::Extracting => Some(1),
            JobState::Scripting => Some(2),
            JobState::Synthesizing => Some(3),
            JobState::Assembling => Some(4),
            JobState::Done => Some(5),
            JobState::Failed => None,
        }
    }

    /// Only single steps forward, or a drop to `Failed` from a live state.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.position(), next.position()) {
            (_, None) => true,
            (Some(current), Some(target)) => target == current + 1,
            (None, Some(_)) => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw generation parameters as received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodcastRequest {
    pub hosts: i64,
    pub guests: i64,
    pub duration_minutes: i64,
    pub preferred_names: Vec<String>,
}

impl Default for PodcastRequest {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS,
            guests: DEFAULT_GUESTS,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            preferred_names: Vec::new(),
        }
    }
}

/// Validated generation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodcastParams {
    pub hosts: u8,
    pub guests: u8,
    pub duration_minutes: u8,
    pub preferred_names: Vec<String>,
}

impl PodcastParams {
    pub fn total_speakers(&self) -> usize {
        self.hosts as usize + self.guests as usize
    }

    pub fn target_words(&self) -> u32 {
        self.duration_minutes as u32 * WORDS_PER_MINUTE
    }
}

impl TryFrom<PodcastRequest> for PodcastParams {
    type Error = PodcastServiceError;

    fn try_from(request: PodcastRequest) -> Result<Self, Self::Error> {
        if !(MIN_HOSTS..=MAX_HOSTS).contains(&request.hosts) {
            return Err(PodcastServiceError::InvalidParameters(format!(
                "Number of hosts must be between {} and {}",
                MIN_HOSTS, MAX_HOSTS
            )));
        }
        if !(MIN_GUESTS..=MAX_GUESTS).contains(&request.guests) {
            return Err(PodcastServiceError::InvalidParameters(format!(
                "Number of guests must be between {} and {}",
                MIN_GUESTS, MAX_GUESTS
            )));
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&request.duration_minutes) {
            return Err(PodcastServiceError::InvalidParameters(format!(
                "Podcast length must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }

        let total = (request.hosts + request.guests) as usize;
        let mut preferred_names: Vec<String> = Vec::new();
        for raw in request.preferred_names {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            // Names become script labels ("Alex:"), so keep them to plain letters
            if !name.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(PodcastServiceError::InvalidParameters(format!(
                    "Speaker name '{}' must contain letters only",
                    name
                )));
            }
            if preferred_names
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(name))
            {
                continue;
            }
            preferred_names.push(name.to_string());
        }
        preferred_names.truncate(total);

        Ok(Self {
            hosts: request.hosts as u8,
            guests: request.guests as u8,
            duration_minutes: request.duration_minutes as u8,
            preferred_names,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    Host,
    Guest,
}

/// A voice offered by the Voice Service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Speaker {
    pub name: String,
    pub role: SpeakerRole,
    pub voice: Voice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utterance {
    pub speaker: String,
    pub role: SpeakerRole,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Script {
    pub utterances: Vec<Utterance>,
}

impl Script {
    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

/// Synthesized audio for one utterance, in script position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub utterance_index: usize,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    pub filename: String,
    pub size_bytes: u64,
    pub utterance_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    UnreadableDocument,
    ContentServiceError,
    VoiceServiceError,
    AssemblyError,
    Cancelled,
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::UnreadableDocument => "UnreadableDocument",
            FailureKind::ContentServiceError => "ContentServiceError",
            FailureKind::VoiceServiceError => "VoiceServiceError",
            FailureKind::AssemblyError => "AssemblyError",
            FailureKind::Cancelled => "Cancelled",
            FailureKind::Internal => "Internal",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Job was cancelled")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub params: PodcastParams,
    pub document: DocumentInfo,
    pub speakers: Vec<Speaker>,
    pub script: Option<Script>,
    pub audio_segments: Option<Vec<AudioSegment>>,
    pub result: Option<AudioArtifact>,
    pub error: Option<JobFailure>,
    pub progress: u8,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(params: PodcastParams, document: DocumentInfo) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            state: JobState::Queued,
            params,
            document,
            speakers: Vec::new(),
            script: None,
            audio_segments: None,
            result: None,
            error: None,
            progress: 0,
            message: "Starting...".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to the next stage of the pipeline
    pub fn transition(
        &mut self,
        next: JobState,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        if next.is_terminal() || !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.set_progress(progress, message);
        Ok(())
    }

    /// Update progress within the current stage
    pub fn set_progress(&mut self, progress: u8, message: impl Into<String>) {
        self.progress = progress.min(100);
        self.message = message.into();
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, artifact: AudioArtifact) -> Result<(), InvalidTransition> {
        if self.state != JobState::Assembling {
            return Err(InvalidTransition {
                from: self.state,
                to: JobState::Done,
            });
        }
        self.state = JobState::Done;
        self.result = Some(artifact);
        // The assembled file supersedes the per-utterance chunks
        self.audio_segments = None;
        self.set_progress(100, "Complete!");
        Ok(())
    }

    pub fn fail(&mut self, failure: JobFailure) -> Result<(), InvalidTransition> {
        if self.is_terminal() {
            return Err(InvalidTransition {
                from: self.state,
                to: JobState::Failed,
            });
        }
        self.state = JobState::Failed;
        self.message = format!("Error: {}", failure.message);
        self.error = Some(failure);
        self.result = None;
        self.audio_segments = None;
        self.progress = 0;
        self.updated_at = Utc::now();
        Ok(())
    }
}
