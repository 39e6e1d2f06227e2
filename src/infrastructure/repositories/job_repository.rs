use super::artifact_repository::ArtifactRepository;
use crate::domain::podcast::{Job, JobId};
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A job snapshot plus the handle used to request its cancellation.
///
/// Snapshots are replaced wholesale on every save, so readers always see a
/// consistent job.
#[derive(Clone)]
pub struct JobRecord {
    pub job: Arc<Job>,
    pub cancel: CancellationToken,
}

/// Live jobs never expire; terminal jobs live for the retention window.
struct RetentionExpiry {
    retention: Duration,
}

impl RetentionExpiry {
    fn expiry_for(&self, record: &JobRecord) -> Option<Duration> {
        if record.job.is_terminal() {
            Some(self.retention)
        } else {
            None
        }
    }
}

impl Expiry<JobId, JobRecord> for RetentionExpiry {
    fn expire_after_create(
        &self,
        _key: &JobId,
        value: &JobRecord,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.expiry_for(value)
    }

    fn expire_after_update(
        &self,
        _key: &JobId,
        value: &JobRecord,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.expiry_for(value)
    }
}

/// How often expired jobs are flushed when the registry is idle
pub const HOUSEKEEPING_PERIOD: Duration = Duration::from_secs(30);

/// Process-local job registry
pub struct JobRepository {
    cache: Cache<JobId, JobRecord>,
}

impl JobRepository {
    pub fn new(retention: Duration, artifacts: Arc<ArtifactRepository>) -> Self {
        let cache = Cache::builder()
            .expire_after(RetentionExpiry { retention })
            .eviction_listener(move |job_id: Arc<JobId>, record: JobRecord, cause| {
                if !matches!(cause, RemovalCause::Expired) {
                    return;
                }
                tracing::info!(job_id = %job_id, state = %record.job.state, "Job retention expired");
                if let Some(artifact) = &record.job.result {
                    artifacts.delete_blocking(&artifact.filename);
                }
            })
            .build();

        Self { cache }
    }

    pub async fn insert(&self, job: Job, cancel: CancellationToken) {
        let id = job.id;
        self.cache
            .insert(
                id,
                JobRecord {
                    job: Arc::new(job),
                    cancel,
                },
            )
            .await;
    }

    pub async fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.cache.get(id).await
    }

    /// Replace the stored snapshot, keeping the cancellation handle.
    ///
    /// Returns `false` if the job is no longer registered.
    pub async fn save(&self, job: &Job) -> bool {
        let Some(existing) = self.cache.get(&job.id).await else {
            tracing::warn!(job_id = %job.id, "Attempted to save an unregistered job");
            return false;
        };
        self.cache
            .insert(
                job.id,
                JobRecord {
                    job: Arc::new(job.clone()),
                    cancel: existing.cancel,
                },
            )
            .await;
        true
    }

    pub async fn remove(&self, id: &JobId) {
        self.cache.invalidate(id).await;
    }

    /// Approximate number of tracked jobs
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Flush expirations every `period` until `shutdown` fires.
    ///
    /// moka only evicts while the cache is being used, so an idle server
    /// would otherwise keep expired artifacts on disk.
    pub async fn run_housekeeping(
        self: Arc<Self>,
        period: Duration,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.cache.run_pending_tasks().await,
            }
        }

        tracing::debug!("Job housekeeping stopped");
    }
}
