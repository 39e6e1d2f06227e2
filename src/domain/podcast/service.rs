use super::error::PodcastServiceError;
use super::model::{DocumentInfo, Job, JobId, PodcastParams, PodcastRequest};
use super::processor::JobMessage;
use super::{Download, JobView, Readiness};
use crate::infrastructure::repositories::{ArtifactRepository, JobRepository};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An uploaded document as received from the client
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl DocumentUpload {
    fn is_pdf(&self) -> bool {
        let by_extension = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        let by_content_type = self
            .content_type
            .as_deref()
            .map(|ct| ct.eq_ignore_ascii_case(PDF_CONTENT_TYPE))
            .unwrap_or(false);
        by_extension || by_content_type
    }
}

pub struct PodcastService {
    jobs: Arc<JobRepository>,
    artifacts: Arc<ArtifactRepository>,
    queue: mpsc::Sender<JobMessage>,
    shutdown: CancellationToken,
    max_upload_bytes: usize,
}

impl PodcastService {
    pub fn new(
        jobs: Arc<JobRepository>,
        artifacts: Arc<ArtifactRepository>,
        queue: mpsc::Sender<JobMessage>,
        shutdown: CancellationToken,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            jobs,
            artifacts,
            queue,
            shutdown,
            max_upload_bytes,
        }
    }

    fn validate_document(&self, document: &DocumentUpload) -> Result<(), PodcastServiceError> {
        if document.filename.is_empty() || document.data.is_empty() {
            return Err(PodcastServiceError::InvalidParameters(
                "No file selected".to_string(),
            ));
        }
        if !document.is_pdf() {
            return Err(PodcastServiceError::InvalidParameters(
                "Invalid file type. Please upload a PDF.".to_string(),
            ));
        }
        if document.data.len() > self.max_upload_bytes {
            return Err(PodcastServiceError::DocumentTooLarge {
                size: document.data.len(),
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait PodcastServiceApi: Send + Sync {
    /// Validate the request, register a `Queued` job and enqueue it.
    ///
    /// Returns as soon as the job is queued; processing happens in the
    /// background.
    async fn submit(
        &self,
        document: DocumentUpload,
        request: PodcastRequest,
    ) -> Result<JobId, PodcastServiceError>;

    /// Current snapshot of a job
    async fn get_status(&self, job_id: &str) -> Result<JobView, PodcastServiceError>;

    /// Request cooperative cancellation.
    ///
    /// The returned view is the snapshot at the time of the request; the job
    /// reaches `Failed` once its worker observes the cancellation.
    async fn cancel(&self, job_id: &str) -> Result<JobView, PodcastServiceError>;

    /// Look up a finished podcast by job id or artifact filename
    async fn resolve_download(&self, identifier: &str) -> Result<Download, PodcastServiceError>;

    async fn readiness(&self) -> Readiness;
}

#[async_trait]
impl PodcastServiceApi for PodcastService {
    async fn submit(
        &self,
        document: DocumentUpload,
        request: PodcastRequest,
    ) -> Result<JobId, PodcastServiceError> {
        let params = PodcastParams::try_from(request)?;
        self.validate_document(&document)?;

        let job = Job::new(
            params,
            DocumentInfo {
                filename: document.filename,
                size_bytes: document.data.len() as u64,
            },
        );
        let job_id = job.id;
        let cancel = self.shutdown.child_token();
        self.jobs.insert(job, cancel.clone()).await;

        let message = JobMessage {
            job_id,
            document: document.data,
            cancel,
        };
        if let Err(e) = self.queue.try_send(message) {
            self.jobs.remove(&job_id).await;
            return Err(match e {
                TrySendError::Full(_) => {
                    tracing::warn!(job_id = %job_id, "Job queue full, rejecting upload");
                    PodcastServiceError::QueueFull
                }
                TrySendError::Closed(_) => {
                    PodcastServiceError::Other(anyhow::anyhow!("job queue is closed"))
                }
            });
        }

        tracing::info!(job_id = %job_id, "Podcast job queued");
        Ok(job_id)
    }

    async fn get_status(&self, job_id: &str) -> Result<JobView, PodcastServiceError> {
        let id = JobId::parse(job_id)
            .ok_or_else(|| PodcastServiceError::NotFound(format!("Job {} not found", job_id)))?;
        let record = self
            .jobs
            .get(&id)
            .await
            .ok_or_else(|| PodcastServiceError::NotFound(format!("Job {} not found", job_id)))?;
        Ok(JobView::from(record.job.as_ref()))
    }

    async fn cancel(&self, job_id: &str) -> Result<JobView, PodcastServiceError> {
        let id = JobId::parse(job_id)
            .ok_or_else(|| PodcastServiceError::NotFound(format!("Job {} not found", job_id)))?;
        let record = self
            .jobs
            .get(&id)
            .await
            .ok_or_else(|| PodcastServiceError::NotFound(format!("Job {} not found", job_id)))?;

        if record.job.is_terminal() {
            return Err(PodcastServiceError::AlreadyFinished);
        }

        record.cancel.cancel();
        tracing::info!(job_id = %id, state = %record.job.state, "Job cancellation requested");
        Ok(JobView::from(record.job.as_ref()))
    }

    async fn resolve_download(&self, identifier: &str) -> Result<Download, PodcastServiceError> {
        let not_found = || PodcastServiceError::NotFound("File not found".to_string());

        let filename = match JobId::parse(identifier) {
            Some(id) => {
                let record = self.jobs.get(&id).await.ok_or_else(not_found)?;
                let artifact = record.job.result.as_ref().ok_or_else(not_found)?;
                artifact.filename.clone()
            }
            None if ArtifactRepository::is_valid_filename(identifier) => identifier.to_string(),
            None => return Err(not_found()),
        };

        let data = self
            .artifacts
            .read(&filename)
            .await
            .map_err(|e| PodcastServiceError::Other(e.into()))?
            .ok_or_else(not_found)?;

        Ok(Download { filename, data })
    }

    async fn readiness(&self) -> Readiness {
        Readiness {
            queue_accepting: !self.queue.is_closed() && !self.shutdown.is_cancelled(),
            output_dir_ready: self.artifacts.is_ready().await,
            tracked_jobs: self.jobs.entry_count(),
        }
    }
}
