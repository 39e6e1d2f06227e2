// End-to-end tests for the StudySauce Backend HTTP API
//
// Each test starts the real router on an ephemeral port with its own job
// registry and temporary output directory. The PDF, content and voice
// providers are replaced by in-process mocks, so tests run in parallel
// without network access.

mod helpers;
mod test_cancel;
mod test_download;
mod test_upload;
