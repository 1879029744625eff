//! Wire format of the paraphrasing service.
//!
//! Submit: `POST <process_url>` with [`SubmitRequest`], answered by [`SubmitResponse`].
//! Poll: `GET <check_url>?taskId=<id>`, answered by [`CheckResponse`].

use serde::{Deserialize, Serialize};

/// Body of a task submission
#[derive(Debug, Serialize)]
pub struct SubmitRequest<'a> {
    /// Method identifier ("paraphrase")
    pub method: &'a str,
    /// Pre-shared credential
    pub api_token: &'a str,
    /// Text to transform
    pub text: &'a str,
}

/// Response to a task submission
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Payload
    pub data: SubmitData,
}

/// Payload of a submission response
#[derive(Debug, Deserialize)]
pub struct SubmitData {
    /// Identifier of the created task
    #[serde(rename = "taskId")]
    pub task_id: RemoteTaskId,
}

/// Task identifier as sent by the service
///
/// The service documents a string but some deployments send a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RemoteTaskId {
    /// String identifier
    Text(String),
    /// Numeric identifier
    Number(i64),
}

impl RemoteTaskId {
    /// Identifier in the form used for the `taskId` query parameter
    pub fn into_string(self) -> String {
        match self {
            RemoteTaskId::Text(s) => s,
            RemoteTaskId::Number(n) => n.to_string(),
        }
    }
}

/// Response to a status check
#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    /// Payload
    pub data: CheckData,
}

/// Payload of a status check response
#[derive(Debug, Deserialize)]
pub struct CheckData {
    /// Whether the task has finished
    pub ready: bool,
    /// Final text, present iff `ready`
    #[serde(default)]
    pub result: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_uses_service_field_names() {
        let body = serde_json::to_value(SubmitRequest {
            method: "paraphrase",
            api_token: "tok",
            text: "hello",
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"method": "paraphrase", "api_token": "tok", "text": "hello"})
        );
    }

    #[test]
    fn submit_response_accepts_string_and_numeric_ids() {
        let text: SubmitResponse = serde_json::from_str(r#"{"data":{"taskId":"abc"}}"#).unwrap();
        assert_eq!(text.data.task_id.into_string(), "abc");

        let number: SubmitResponse = serde_json::from_str(r#"{"data":{"taskId":17}}"#).unwrap();
        assert_eq!(number.data.task_id.into_string(), "17");
    }

    #[test]
    fn submit_response_without_task_id_is_rejected() {
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"data":{}}"#).is_err());
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"error":"quota"}"#).is_err());
    }

    #[test]
    fn check_response_result_is_optional_until_ready() {
        let pending: CheckResponse =
            serde_json::from_str(r#"{"data":{"ready":false}}"#).unwrap();
        assert!(!pending.data.ready);
        assert!(pending.data.result.is_none());

        let done: CheckResponse =
            serde_json::from_str(r#"{"data":{"ready":true,"result":"HELLO"}}"#).unwrap();
        assert_eq!(done.data.result.as_deref(), Some("HELLO"));
    }

    #[test]
    fn check_response_without_ready_flag_is_rejected() {
        assert!(serde_json::from_str::<CheckResponse>(r#"{"data":{"result":"x"}}"#).is_err());
    }
}
