//! Shared test helpers: a mock paraphrasing service and worker fixtures.

use crate::config::{Config, ServiceConfig};
use crate::service::FailureSink;
use crate::types::TaskErrorKind;
use crate::worker::ParaphraseWorker;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Submission endpoint path on the mock server
pub(crate) const PROCESS_PATH: &str = "/process";
/// Status endpoint path on the mock server
pub(crate) const CHECK_PATH: &str = "/check";

/// Service config pointing at `server` with a short poll interval
pub(crate) fn service_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig {
        process_url: format!("{}{}", server.uri(), PROCESS_PATH),
        check_url: format!("{}{}", server.uri(), CHECK_PATH),
        api_token: "test-token".to_string(),
        poll_interval: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// Mount a task for `text`: submission returns `task_id`, the first
/// `pending_polls` checks report not ready, then the check returns `result`.
pub(crate) async fn mount_task(
    server: &MockServer,
    text: &str,
    task_id: &str,
    pending_polls: u64,
    result: &str,
) {
    Mock::given(method("POST"))
        .and(path(PROCESS_PATH))
        .and(body_partial_json(json!({ "text": text })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "taskId": task_id }
        })))
        .mount(server)
        .await;

    if pending_polls > 0 {
        Mock::given(method("GET"))
            .and(path(CHECK_PATH))
            .and(query_param("taskId", task_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "ready": false }
            })))
            .up_to_n_times(pending_polls)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(CHECK_PATH))
        .and(query_param("taskId", task_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ready": true, "result": result }
        })))
        .mount(server)
        .await;
}

/// Mount a submission for `text` that fails with `status`
pub(crate) async fn mount_failed_submission(server: &MockServer, text: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(PROCESS_PATH))
        .and(body_partial_json(json!({ "text": text })))
        .respond_with(ResponseTemplate::new(status).set_body_string("boom"))
        .mount(server)
        .await;
}

/// Mount a service that upper-cases every text and is ready immediately
///
/// Task IDs are the submitted text itself.
pub(crate) async fn mount_uppercase_service(server: &MockServer, texts: &[&str]) {
    for text in texts {
        mount_task(server, text, text, 0, &text.to_uppercase()).await;
    }
}

/// Number of status checks the server received for `task_id`
pub(crate) async fn poll_count(server: &MockServer, task_id: &str) -> usize {
    received(server)
        .await
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == CHECK_PATH)
        .filter(|r| {
            r.url
                .query_pairs()
                .any(|(k, v)| k == "taskId" && v == task_id)
        })
        .count()
}

/// Number of requests the server received at `request_path`
pub(crate) async fn request_count(server: &MockServer, request_path: &str) -> usize {
    received(server)
        .await
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

/// Failure sink that remembers what it was told
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) failures: Mutex<Vec<(usize, TaskErrorKind)>>,
}

impl RecordingSink {
    pub(crate) fn recorded(&self) -> Vec<(usize, TaskErrorKind)> {
        self.failures.lock().unwrap().clone()
    }
}

impl FailureSink for RecordingSink {
    fn report_failure(&self, item_index: usize, kind: TaskErrorKind, _message: &str) {
        self.failures.lock().unwrap().push((item_index, kind));
    }
}

/// Worker config backed by `server` and a database inside a fresh tempdir
pub(crate) fn test_config(server: &MockServer) -> (Config, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.service = service_config(server);
    config.persistence.database_path = temp_dir.path().join("test.db");
    (config, temp_dir)
}

/// Worker backed by `server`; the tempdir must be kept alive
pub(crate) async fn create_test_worker(server: &MockServer) -> (ParaphraseWorker, tempfile::TempDir) {
    let (config, temp_dir) = test_config(server);
    let worker = ParaphraseWorker::new(config).await.unwrap();
    (worker, temp_dir)
}

/// Build an .xlsx workbook with a header row and string cells
pub(crate) fn xlsx_bytes(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet
                .write_string(row_idx as u32 + 1, col as u16, *value)
                .unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}
