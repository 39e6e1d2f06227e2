use super::assembly::{artifact_filename, assemble};
use super::model::{
    AudioArtifact, AudioSegment, FailureKind, Job, JobFailure, JobId, JobState, Script,
};
use super::retry::RetryPolicy;
use super::script::{parse_script, script_prompt};
use super::speakers::{assign_speakers, pick_names};
use super::summary::{combine_summaries, normalize_pages, PageText, Summarizer};
use crate::infrastructure::repositories::{
    ArtifactRepository, ContentRepository, DocumentRepository, JobRepository, VoiceRepository,
};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// A queued job. The document bytes live here, not in the job snapshot.
pub struct JobMessage {
    pub job_id: JobId,
    pub document: Bytes,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessorSettings {
    pub retry: RetryPolicy,
    pub synthesis_concurrency: usize,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            synthesis_concurrency: 2,
        }
    }
}

/// Drives jobs from `Queued` to a terminal state.
///
/// Every state change is published as a whole new snapshot through the
/// [`JobRepository`]; the processor works on its own copy in between.
pub struct JobProcessor {
    jobs: Arc<JobRepository>,
    artifacts: Arc<ArtifactRepository>,
    documents: Arc<dyn DocumentRepository>,
    content: Arc<dyn ContentRepository>,
    voices: Arc<dyn VoiceRepository>,
    summarizer: Summarizer,
    settings: ProcessorSettings,
}

fn internal(err: impl std::fmt::Display) -> JobFailure {
    JobFailure::new(FailureKind::Internal, err.to_string())
}

/// Run a stage unless the job is cancelled first
async fn guarded<T>(
    cancel: &CancellationToken,
    stage: impl Future<Output = Result<T, JobFailure>>,
) -> Result<T, JobFailure> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobFailure::cancelled()),
        result = stage => result,
    }
}

impl JobProcessor {
    pub fn new(
        jobs: Arc<JobRepository>,
        artifacts: Arc<ArtifactRepository>,
        documents: Arc<dyn DocumentRepository>,
        content: Arc<dyn ContentRepository>,
        voices: Arc<dyn VoiceRepository>,
        settings: ProcessorSettings,
    ) -> Self {
        let summarizer = Summarizer::new(content.clone(), settings.retry);
        Self {
            jobs,
            artifacts,
            documents,
            content,
            voices,
            summarizer,
            settings: ProcessorSettings {
                synthesis_concurrency: settings.synthesis_concurrency.max(1),
                ..settings
            },
        }
    }

    /// Dispatch queued jobs, at most `job_concurrency` at a time, until the
    /// queue closes or `shutdown` fires.
    pub async fn run(
        self: Arc<Self>,
        mut receiver: mpsc::Receiver<JobMessage>,
        job_concurrency: usize,
        shutdown: CancellationToken,
    ) {
        let semaphore = Arc::new(Semaphore::new(job_concurrency.max(1)));
        tracing::info!(job_concurrency, "Job dispatcher started");

        loop {
            let message = tokio::select! {
                _ = shutdown.cancelled() => break,
                message = receiver.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let processor = self.clone();
            tokio::spawn(async move {
                processor.process(message).await;
                drop(permit);
            });
        }

        tracing::info!("Job dispatcher stopped");
    }

    pub async fn process(&self, message: JobMessage) {
        let JobMessage {
            job_id,
            document,
            cancel,
        } = message;
        let span = tracing::info_span!("podcast_job", job_id = %job_id);

        async move {
            let Some(record) = self.jobs.get(&job_id).await else {
                tracing::warn!("Job vanished before processing");
                return;
            };
            let mut job = (*record.job).clone();
            if job.is_terminal() {
                return;
            }

            let started = Instant::now();
            tracing::info!(
                document = %job.document.filename,
                size_bytes = job.document.size_bytes,
                hosts = job.params.hosts,
                guests = job.params.guests,
                duration_minutes = job.params.duration_minutes,
                "Processing podcast job"
            );

            match self.run_stages(&mut job, &document, &cancel).await {
                Ok(()) => tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Podcast job completed"
                ),
                Err(failure) => {
                    tracing::warn!(
                        kind = %failure.kind,
                        error = %failure.message,
                        stage = %job.state,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Podcast job failed"
                    );
                    self.record_failure(&mut job, failure).await;
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        job: &mut Job,
        document: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), JobFailure> {
        let (pages, total_pages) = guarded(cancel, self.extract(job, document)).await?;
        guarded(cancel, self.write_script(job, &pages, total_pages)).await?;
        guarded(cancel, self.synthesize(job)).await?;
        let audio = guarded(cancel, self.assemble(job)).await?;
        // Unguarded: a written artifact always ends in Done
        self.publish(job, audio).await
    }

    /// Move the job to `Failed` and publish it.
    ///
    /// A job that already reached a terminal state keeps it, but is still
    /// published so the stored snapshot never lags behind.
    async fn record_failure(&self, job: &mut Job, failure: JobFailure) {
        if let Err(e) = job.fail(failure) {
            tracing::warn!(
                error = %e,
                state = %job.state,
                "Job already finished, keeping its state"
            );
        }
        if job.is_terminal() {
            self.jobs.save(job).await;
        }
    }

    async fn advance(
        &self,
        job: &mut Job,
        next: JobState,
        progress: u8,
        message: &str,
    ) -> Result<(), JobFailure> {
        job.transition(next, progress, message).map_err(internal)?;
        tracing::debug!(state = %next, progress, "Job advanced");
        self.jobs.save(job).await;
        Ok(())
    }

    async fn report(&self, job: &mut Job, progress: u8, message: String) {
        job.set_progress(progress, message);
        self.jobs.save(job).await;
    }

    async fn extract(
        &self,
        job: &mut Job,
        document: &[u8],
    ) -> Result<(Vec<PageText>, usize), JobFailure> {
        self.advance(job, JobState::Extracting, 10, "Processing PDF...")
            .await?;

        let raw_pages = self.documents.extract_pages(document).await.map_err(|e| {
            JobFailure::new(
                FailureKind::UnreadableDocument,
                format!("Could not read PDF: {}", e),
            )
        })?;

        let pages = normalize_pages(&raw_pages);
        tracing::info!(
            page_count = raw_pages.len(),
            usable_pages = pages.len(),
            "Document text extracted"
        );

        if pages.is_empty() {
            return Err(JobFailure::new(
                FailureKind::UnreadableDocument,
                "No valid pages found in PDF",
            ));
        }

        Ok((pages, raw_pages.len()))
    }

    async fn write_script(
        &self,
        job: &mut Job,
        pages: &[PageText],
        total_pages: usize,
    ) -> Result<(), JobFailure> {
        self.advance(job, JobState::Scripting, 10, "Summarizing document...")
            .await?;

        let mut summaries = Vec::with_capacity(pages.len());
        for page in pages {
            let progress = 10 + (page.number * 30 / total_pages.max(1)) as u8;
            self.report(
                job,
                progress,
                format!("Summarizing page {}/{}...", page.number, total_pages),
            )
            .await;

            let summary = self.summarizer.summarize(&page.text).await.map_err(|e| {
                JobFailure::new(
                    FailureKind::ContentServiceError,
                    format!("Failed to summarize page {}: {}", page.number, e),
                )
            })?;
            summaries.push(summary);
        }
        let summary = combine_summaries(&summaries);
        tracing::debug!(summary_length = summary.len(), "Document summarized");

        let names = pick_names(&job.params, &mut rand::thread_rng());
        let catalogue = match self
            .settings
            .retry
            .run("list_voices", || self.voices.list_voices())
            .await
        {
            Ok(voices) => voices,
            Err(e) => {
                tracing::warn!(error = %e, "Voice catalogue unavailable, using fallback voices");
                Vec::new()
            }
        };
        job.speakers = assign_speakers(&job.params, names, catalogue, &mut rand::thread_rng());
        tracing::info!(
            speakers = ?job.speakers.iter().map(|s| (&s.name, &s.voice.name)).collect::<Vec<_>>(),
            "Speakers assigned"
        );

        self.report(job, 45, "Generating podcast script...".to_string())
            .await;

        let prompt = script_prompt(&summary, &job.speakers, &job.params);
        let text = self
            .settings
            .retry
            .run("generate_script", || self.content.generate(&prompt))
            .await
            .map_err(|e| {
                JobFailure::new(
                    FailureKind::ContentServiceError,
                    format!("Failed to generate script: {}", e),
                )
            })?;

        let script = parse_script(&text, &job.speakers);
        if script.is_empty() {
            return Err(JobFailure::new(
                FailureKind::ContentServiceError,
                "Generated script contains no dialogue lines",
            ));
        }
        tracing::info!(
            utterance_count = script.len(),
            word_count = text.split_whitespace().count(),
            "Script generated"
        );

        // Published together with the move to Synthesizing
        job.script = Some(script);
        Ok(())
    }

    async fn synthesize(&self, job: &mut Job) -> Result<(), JobFailure> {
        self.advance(job, JobState::Synthesizing, 60, "Converting to audio...")
            .await?;

        let script = job.script.clone().unwrap_or_default();
        let lines = script
            .utterances
            .into_iter()
            .enumerate()
            .map(|(index, utterance)| {
                job.speakers
                    .iter()
                    .find(|s| s.name == utterance.speaker)
                    .map(|s| (index, utterance.text, s.voice.voice_id.clone()))
                    .ok_or_else(|| internal(format!("no voice for speaker {}", utterance.speaker)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total = lines.len();

        let calls = lines.into_iter().map(|(index, text, voice_id)| async move {
            self.settings
                .retry
                .run("synthesize", || self.voices.synthesize(&text, &voice_id))
                .await
                .map(|audio| AudioSegment {
                    utterance_index: index,
                    data: Bytes::from(audio),
                })
                .map_err(|e| {
                    JobFailure::new(
                        FailureKind::VoiceServiceError,
                        format!("Failed to synthesize line {}: {}", index + 1, e),
                    )
                })
        });
        let mut results = futures::stream::iter(calls).buffered(self.settings.synthesis_concurrency);

        let mut done = 0;
        while let Some(result) = results.next().await {
            let segment = result?;
            job.audio_segments.get_or_insert_with(Vec::new).push(segment);
            done += 1;
            let progress = (60 + done * 35 / total).min(95) as u8;
            self.report(
                job,
                progress,
                format!("Processing audio ({}/{})...", done, total),
            )
            .await;
        }

        Ok(())
    }

    async fn assemble(&self, job: &mut Job) -> Result<Vec<u8>, JobFailure> {
        self.advance(job, JobState::Assembling, 95, "Finalizing podcast...")
            .await?;

        let segments = job.audio_segments.as_deref().unwrap_or(&[]);
        assemble(segments).map_err(|e| JobFailure::new(FailureKind::AssemblyError, e.to_string()))
    }

    async fn publish(&self, job: &mut Job, audio: Vec<u8>) -> Result<(), JobFailure> {
        let filename = artifact_filename(&job.id, Utc::now());
        let size_bytes = self.artifacts.write(&filename, &audio).await.map_err(|e| {
            JobFailure::new(
                FailureKind::AssemblyError,
                format!("Failed to write podcast file: {}", e),
            )
        })?;

        let utterance_count = job.script.as_ref().map(Script::len).unwrap_or_default();
        job.complete(AudioArtifact {
            filename,
            size_bytes,
            utterance_count,
        })
        .map_err(internal)?;
        self.jobs.save(job).await;
        Ok(())
    }
}
