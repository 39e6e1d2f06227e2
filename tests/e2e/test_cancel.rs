use crate::e2e::helpers;

use helpers::mocks::{ContentBehavior, MockContent, MockVoices};
use helpers::{TestContext, DEFAULT_MAX_UPLOAD_BYTES};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use studysauce_backend::domain::podcast::{FailureKind, JobState};
use test_context::test_context;

async fn hanging_context() -> TestContext {
    TestContext::start(
        MockContent::new(ContentBehavior::Hang),
        MockVoices::working(),
        DEFAULT_MAX_UPLOAD_BYTES,
    )
    .await
}

#[tokio::test]
async fn it_should_cancel_running_job() {
    let ctx = hanging_context().await;
    let job_id = ctx.upload_podcast().await;
    ctx.wait_for_state(&job_id, JobState::Scripting).await;

    let response = ctx
        .client
        .post_empty(&format!("/cancel/{}", job_id))
        .await
        .unwrap();
    response.assert_status(StatusCode::ACCEPTED);

    let view = ctx.wait_for_state(&job_id, JobState::Failed).await;
    assert_eq!(view.state, JobState::Failed);
    assert_eq!(view.error_kind, Some(FailureKind::Cancelled));
    assert_eq!(view.download_url, None);
}

#[tokio::test]
async fn it_should_reject_cancelling_finished_job() {
    let ctx = hanging_context().await;
    let job_id = ctx.upload_podcast().await;
    ctx.wait_for_state(&job_id, JobState::Scripting).await;

    ctx.client
        .post_empty(&format!("/cancel/{}", job_id))
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);
    ctx.wait_for_state(&job_id, JobState::Failed).await;

    let response = ctx
        .client
        .post_empty(&format!("/cancel/{}", job_id))
        .await
        .unwrap();

    response.assert_status(StatusCode::CONFLICT);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_cancelling_completed_job(ctx: &TestContext) {
    let job_id = ctx.upload_podcast().await;
    ctx.wait_for_state(&job_id, JobState::Done).await;

    let response = ctx
        .client
        .post_empty(&format!("/cancel/{}", job_id))
        .await
        .unwrap();

    response.assert_status(StatusCode::CONFLICT);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_when_cancelling_unknown_job(ctx: &TestContext) {
    let response = ctx
        .client
        .post_empty("/cancel/00000000-0000-4000-8000-000000000000")
        .await
        .unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}
