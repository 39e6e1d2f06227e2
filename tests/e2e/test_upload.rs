use crate::e2e::helpers;

use helpers::api_client::file_part;
use helpers::mocks::{ContentBehavior, MockContent, MockVoices};
use helpers::{fake_pdf, podcast_form, TestContext};
use hyper::StatusCode;
use reqwest::multipart::Form;
use pretty_assertions::assert_eq;
use studysauce_backend::domain::podcast::{FailureKind, JobState, JobView, UploadResponse};
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_pdf_and_return_job_id(ctx: &TestContext) {
    let response = ctx
        .client
        .post_multipart("/upload", podcast_form())
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    let upload: UploadResponse = response.json().unwrap();

    let status = ctx
        .client
        .get(&format!("/status/{}", upload.job_id))
        .await
        .unwrap();
    status.assert_status(StatusCode::OK);
    let view: JobView = status.json().unwrap();
    assert_eq!(view.job_id, upload.job_id);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_assign_unique_job_ids(ctx: &TestContext) {
    let first = ctx.upload_podcast().await;
    let second = ctx.upload_podcast().await;

    assert_ne!(first, second);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_alternate_field_names_and_defaults(ctx: &TestContext) {
    let form = Form::new()
        .part("file", file_part("notes.pdf", "application/pdf", &fake_pdf()))
        .text("hosts", "1")
        .text("duration", "3");

    let response = ctx.client.post_multipart("/upload", form).await.unwrap();

    response.assert_status(StatusCode::ACCEPTED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_upload_without_file(ctx: &TestContext) {
    let form = Form::new().text("num_hosts", "2");

    let response = ctx.client.post_multipart("/upload", form).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("No PDF file provided");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_non_pdf_files(ctx: &TestContext) {
    let form = Form::new().part("pdf", file_part("notes.txt", "text/plain", b"plain text"));

    let response = ctx.client.post_multipart("/upload", form).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid file type");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_out_of_range_parameters(ctx: &TestContext) {
    let cases = [
        ("num_hosts", "0", "Number of hosts"),
        ("num_hosts", "5", "Number of hosts"),
        ("num_guests", "4", "Number of guests"),
        ("podcast_length", "2", "Podcast length"),
        ("podcast_length", "16", "Podcast length"),
    ];

    for (field, value, expected) in cases {
        let form = Form::new()
            .part("pdf", file_part("cells.pdf", "application/pdf", &fake_pdf()))
            .text(field, value);

        let response = ctx.client.post_multipart("/upload", form).await.unwrap();

        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_message(expected);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_non_numeric_parameters(ctx: &TestContext) {
    let form = Form::new()
        .part("pdf", file_part("cells.pdf", "application/pdf", &fake_pdf()))
        .text("num_guests", "several");

    let response = ctx.client.post_multipart("/upload", form).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("num_guests must be a whole number");
}

#[tokio::test]
async fn it_should_reject_documents_over_the_size_limit() {
    let ctx = TestContext::start(
        MockContent::new(ContentBehavior::Scripted),
        MockVoices::working(),
        1024,
    )
    .await;
    let mut large = fake_pdf();
    large.resize(4096, b' ');
    let form = Form::new().part("pdf", file_part("big.pdf", "application/pdf", &large));

    let response = ctx.client.post_multipart("/upload", form).await.unwrap();

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_job_for_unreadable_document(ctx: &TestContext) {
    let form = Form::new()
        .part("pdf", file_part("broken.pdf", "application/pdf", b"not really a pdf"))
        .text("selected_hosts[]", "Alex");

    let response = ctx.client.post_multipart("/upload", form).await.unwrap();
    response.assert_status(StatusCode::ACCEPTED);
    let upload: UploadResponse = response.json().unwrap();

    let view = ctx
        .wait_for_state(&upload.job_id.to_string(), JobState::Failed)
        .await;

    assert_eq!(view.state, JobState::Failed);
    assert_eq!(view.error_kind, Some(FailureKind::UnreadableDocument));
    assert_eq!(ctx.content.calls(), 0);
}
