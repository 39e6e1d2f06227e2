use crate::e2e::helpers;

use helpers::mocks::{ContentBehavior, MockContent, MockVoices};
use helpers::{TestContext, DEFAULT_MAX_UPLOAD_BYTES};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use studysauce_backend::domain::podcast::JobState;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_download_podcast_by_job_id(ctx: &TestContext) {
    let job_id = ctx.upload_podcast().await;
    let view = ctx.wait_for_state(&job_id, JobState::Done).await;
    let filename = view.filename.expect("Done job should expose a filename");

    let response = ctx
        .client
        .get(&format!("/download/{}", job_id))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg")
        .assert_header(
            "content-disposition",
            &format!("attachment; filename=\"{}\"", filename),
        );
    assert!(response.body_bytes.starts_with(b"ID3"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_download_podcast_by_filename(ctx: &TestContext) {
    let job_id = ctx.upload_podcast().await;
    let view = ctx.wait_for_state(&job_id, JobState::Done).await;
    let download_url = view.download_url.expect("Done job should expose a download url");

    let response = ctx.client.get(&download_url).await.unwrap();

    response.assert_status(StatusCode::OK);
    let on_disk = std::fs::read(
        ctx.output_dir
            .path()
            .join(view.filename.expect("Done job should expose a filename")),
    )
    .unwrap();
    assert_eq!(response.body_bytes, on_disk);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_file(ctx: &TestContext) {
    let response = ctx
        .client
        .get("/download/podcast_20240101_000000_deadbeef.mp3")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("File not found");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_path_traversal(ctx: &TestContext) {
    let response = ctx
        .client
        .get("/download/..%2F..%2Fetc%2Fpasswd")
        .await
        .unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn it_should_not_serve_unfinished_jobs() {
    let ctx = TestContext::start(
        MockContent::new(ContentBehavior::Hang),
        MockVoices::working(),
        DEFAULT_MAX_UPLOAD_BYTES,
    )
    .await;
    let job_id = ctx.upload_podcast().await;
    ctx.wait_for_state(&job_id, JobState::Scripting).await;

    let response = ctx
        .client
        .get(&format!("/download/{}", job_id))
        .await
        .unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}
