use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use bytes::Bytes;
use std::sync::Arc;

use crate::{
    domain::podcast::{
        DocumentUpload, JobView, PodcastRequest, PodcastService, PodcastServiceApi,
        UploadResponse,
    },
    error::{AppError, AppResult},
};

const FILE_FIELDS: [&str; 3] = ["pdf", "file", "document"];

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Blank values fall back to the default
fn parse_count(field: &str, value: &str, default: i64) -> AppResult<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be a whole number", field)))
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(multipart_error)
}

/// Upload form as sent by the web client
#[derive(Debug, Default)]
struct UploadForm {
    document: Option<DocumentUpload>,
    hosts: Option<String>,
    guests: Option<String>,
    duration: Option<String>,
    selected_names: Vec<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                n if FILE_FIELDS.contains(&n) => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data: Bytes = field.bytes().await.map_err(multipart_error)?;
                    form.document = Some(DocumentUpload {
                        filename,
                        content_type,
                        data,
                    });
                }
                "num_hosts" | "hosts" => form.hosts = Some(text(field).await?),
                "num_guests" | "guests" => form.guests = Some(text(field).await?),
                "podcast_length" | "duration" => form.duration = Some(text(field).await?),
                "selected_hosts[]" | "selected_hosts" => {
                    let value = text(field).await?;
                    if !value.trim().is_empty() {
                        form.selected_names.push(value);
                    }
                }
                other => tracing::debug!(field = other, "Ignoring unknown upload field"),
            }
        }

        Ok(form)
    }

    fn into_parts(self) -> AppResult<(DocumentUpload, PodcastRequest)> {
        let document = self
            .document
            .ok_or_else(|| AppError::BadRequest("No PDF file provided".to_string()))?;

        let defaults = PodcastRequest::default();
        let request = PodcastRequest {
            hosts: match &self.hosts {
                Some(v) => parse_count("num_hosts", v, defaults.hosts)?,
                None => defaults.hosts,
            },
            guests: match &self.guests {
                Some(v) => parse_count("num_guests", v, defaults.guests)?,
                None => defaults.guests,
            },
            duration_minutes: match &self.duration {
                Some(v) => parse_count("podcast_length", v, defaults.duration_minutes)?,
                None => defaults.duration_minutes,
            },
            preferred_names: self.selected_names,
        };

        Ok((document, request))
    }
}

pub struct PodcastController {
    podcast_service: Arc<PodcastService>,
}

impl PodcastController {
    pub fn new(podcast_service: Arc<PodcastService>) -> Self {
        Self { podcast_service }
    }

    /// POST /upload - Accept a PDF and queue a podcast job
    pub async fn upload(
        State(controller): State<Arc<PodcastController>>,
        multipart: Multipart,
    ) -> AppResult<(StatusCode, Json<UploadResponse>)> {
        let (document, request) = UploadForm::read(multipart).await?.into_parts()?;

        tracing::info!(
            filename = %document.filename,
            size_bytes = document.data.len(),
            hosts = request.hosts,
            guests = request.guests,
            duration_minutes = request.duration_minutes,
            "Podcast upload received"
        );

        let job_id = controller.podcast_service.submit(document, request).await?;
        Ok((StatusCode::ACCEPTED, Json(UploadResponse { job_id })))
    }

    /// GET /status/:job_id - Poll job progress
    pub async fn status(
        State(controller): State<Arc<PodcastController>>,
        Path(job_id): Path<String>,
    ) -> AppResult<Json<JobView>> {
        let view = controller.podcast_service.get_status(&job_id).await?;
        Ok(Json(view))
    }

    /// POST /cancel/:job_id - Request cancellation
    pub async fn cancel(
        State(controller): State<Arc<PodcastController>>,
        Path(job_id): Path<String>,
    ) -> AppResult<(StatusCode, Json<JobView>)> {
        let view = controller.podcast_service.cancel(&job_id).await?;
        Ok((StatusCode::ACCEPTED, Json(view)))
    }

    /// GET /download/:identifier - Serve the podcast by job id or filename
    pub async fn download(
        State(controller): State<Arc<PodcastController>>,
        Path(identifier): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let download = controller
            .podcast_service
            .resolve_download(&identifier)
            .await?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
        let disposition = format!("attachment; filename=\"{}\"", download.filename);
        let disposition = HeaderValue::from_str(&disposition)
            .map_err(|e| AppError::Internal(format!("invalid content disposition: {}", e)))?;
        headers.insert(header::CONTENT_DISPOSITION, disposition);

        Ok((StatusCode::OK, headers, Body::from(download.data)))
    }
}
