use reqwest::multipart::Form;
use std::sync::Arc;
use std::time::Duration;
use studysauce_backend::controllers::podcast::PodcastController;
use studysauce_backend::domain::podcast::{
    JobProcessor, JobState, JobView, PodcastService, ProcessorSettings, RetryPolicy,
    UploadResponse,
};
use studysauce_backend::infrastructure::http::build_router;
use studysauce_backend::infrastructure::repositories::{ArtifactRepository, JobRepository};
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub mod api_client;
pub mod mocks;

use api_client::{file_part, TestClient};
use mocks::{ContentBehavior, MockContent, MockDocuments, MockVoices};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub struct TestContext {
    pub client: TestClient,
    pub content: Arc<MockContent>,
    pub output_dir: TempDir,
    shutdown: CancellationToken,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        TestContext::start(
            MockContent::new(ContentBehavior::Scripted),
            MockVoices::working(),
            DEFAULT_MAX_UPLOAD_BYTES,
        )
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            self.shutdown.cancel();
        }
    }
}

impl TestContext {
    /// Start the real router on an ephemeral port, backed by mock providers
    pub async fn start(
        content: Arc<MockContent>,
        voices: Arc<MockVoices>,
        max_upload_bytes: usize,
    ) -> Self {
        let output_dir = tempfile::tempdir().expect("Failed to create output dir");
        let shutdown = CancellationToken::new();

        let artifact_repo = Arc::new(ArtifactRepository::new(output_dir.path()));
        artifact_repo
            .ensure_dir()
            .await
            .expect("Failed to prepare output dir");
        let job_repo = Arc::new(JobRepository::new(
            Duration::from_secs(60),
            artifact_repo.clone(),
        ));

        let (job_sender, job_receiver) = mpsc::channel(8);
        let processor = Arc::new(JobProcessor::new(
            job_repo.clone(),
            artifact_repo.clone(),
            Arc::new(MockDocuments),
            content.clone(),
            voices,
            ProcessorSettings {
                retry: RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
                synthesis_concurrency: 2,
            },
        ));
        tokio::spawn(processor.run(job_receiver, 2, shutdown.clone()));

        let podcast_service = Arc::new(PodcastService::new(
            job_repo,
            artifact_repo,
            job_sender,
            shutdown.clone(),
            max_upload_bytes,
        ));
        let podcast_controller = Arc::new(PodcastController::new(podcast_service.clone()));
        let app = build_router(podcast_service, podcast_controller, max_upload_bytes);

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let base_url = format!("http://{}", addr);

        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
                .unwrap();
        });

        Self {
            client: TestClient::new(&base_url),
            content,
            output_dir,
            shutdown,
        }
    }

    /// Upload a small PDF for two hosts named Alex and Taylor
    pub async fn upload_podcast(&self) -> String {
        let response = self
            .client
            .post_multipart("/upload", podcast_form())
            .await
            .unwrap();
        response.assert_status(hyper::StatusCode::ACCEPTED);
        let upload: UploadResponse = response.json().unwrap();
        upload.job_id.to_string()
    }

    /// Poll the status endpoint until the job reaches `state` or fails
    pub async fn wait_for_state(&self, job_id: &str, state: JobState) -> JobView {
        let mut last = None;
        for _ in 0..250 {
            let response = self
                .client
                .get(&format!("/status/{}", job_id))
                .await
                .unwrap();
            response.assert_status(hyper::StatusCode::OK);
            let view: JobView = response.json().unwrap();
            if view.state == state || view.state.is_terminal() {
                return view;
            }
            last = Some(view);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Job {} never reached {:?}, last seen {:?}", job_id, state, last);
    }
}

pub fn fake_pdf() -> Vec<u8> {
    b"%PDF-1.4\n% test document\n%%EOF\n".to_vec()
}

pub fn podcast_form() -> Form {
    Form::new()
        .part("pdf", file_part("cells.pdf", "application/pdf", &fake_pdf()))
        .text("num_hosts", "2")
        .text("num_guests", "0")
        .text("podcast_length", "5")
        .text("selected_hosts[]", "Alex")
        .text("selected_hosts[]", "Taylor")
}
