use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clamp_chars;
use crate::extract::StatusHint;

/// Longest string accepted for any remote field.
pub const FIELD_MAX: usize = 120;

const FIELD_KEYS: &[&str] = &["jobTitle", "company", "location", "statusHint"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteExtractionPayload {
    pub text: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteExtractionResponse {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub status_hint: StatusHint,
}

impl RemoteExtractionResponse {
    /// Lenient read of a JSON object: missing or non-string fields become
    /// empty, strings are trimmed and clamped, any hint but "submitted" is
    /// `Unknown`.
    pub fn from_object(map: &Map<String, Value>) -> Self {
        let field = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .map(|s| clamp_chars(s.trim(), FIELD_MAX))
                .unwrap_or_default()
        };
        Self {
            job_title: field("jobTitle"),
            company: field("company"),
            location: field("location"),
            status_hint: StatusHint::from_raw(&field("statusHint")),
        }
    }

    /// Strict parse of a response body: must be a JSON object carrying at
    /// least one of the expected keys.
    pub fn parse(body: &str) -> Result<Self, RemoteError> {
        let value: Value = serde_json::from_str(body).map_err(RemoteError::NotJson)?;
        let map = value.as_object().ok_or(RemoteError::NotObject)?;
        if !FIELD_KEYS.iter().any(|k| map.contains_key(*k)) {
            return Err(RemoteError::MissingFields);
        }
        Ok(Self::from_object(map))
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("body is not JSON: {0}")]
    NotJson(serde_json::Error),
    #[error("body is not a JSON object")]
    NotObject,
    #[error("body has none of the expected fields")]
    MissingFields,
}

/// Client for a remote `/extract` endpoint.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Best effort: every failure is logged and becomes `None`.
    pub async fn extract(
        &self,
        payload: &RemoteExtractionPayload,
    ) -> Option<RemoteExtractionResponse> {
        match self.try_extract(payload).await {
            Ok(response) => {
                debug!(endpoint = %self.endpoint, "remote extraction ok");
                Some(response)
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "remote extraction unavailable");
                None
            }
        }
    }

    async fn try_extract(
        &self,
        payload: &RemoteExtractionPayload,
    ) -> Result<RemoteExtractionResponse, RemoteError> {
        let response = self.http.post(&self.endpoint).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status));
        }
        let body = response.text().await?;
        RemoteExtractionResponse::parse(&body)
    }
}

pub async fn extract_remote(
    payload: &RemoteExtractionPayload,
    endpoint: &str,
) -> Option<RemoteExtractionResponse> {
    RemoteClient::new(endpoint).extract(payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/extract", addr)
    }

    fn payload() -> RemoteExtractionPayload {
        RemoteExtractionPayload {
            text: "Backend Engineer at Globex".into(),
            url: "https://globex.test/jobs/1".into(),
            title: "Careers".into(),
        }
    }

    #[test]
    fn parse_clamps_and_normalises() {
        let body = json!({
            "jobTitle": format!("  {}  ", "t".repeat(200)),
            "company": "Globex",
            "location": 42,
            "statusHint": "Submitted"
        })
        .to_string();
        let r = RemoteExtractionResponse::parse(&body).unwrap();
        assert_eq!(r.job_title.chars().count(), FIELD_MAX);
        assert_eq!(r.company, "Globex");
        assert_eq!(r.location, "");
        assert_eq!(r.status_hint, StatusHint::Unknown);
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        assert!(matches!(RemoteExtractionResponse::parse("<html>"), Err(RemoteError::NotJson(_))));
        assert!(matches!(RemoteExtractionResponse::parse("[1,2]"), Err(RemoteError::NotObject)));
        assert!(matches!(RemoteExtractionResponse::parse("\"x\""), Err(RemoteError::NotObject)));
        assert!(matches!(RemoteExtractionResponse::parse("{\"error\":\"x\"}"), Err(RemoteError::MissingFields)));
    }

    #[tokio::test]
    async fn successful_call() {
        let endpoint = serve(Router::new().route(
            "/extract",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["url"], "https://globex.test/jobs/1");
                Json(json!({
                    "jobTitle": "Backend Engineer",
                    "company": "Globex",
                    "location": "",
                    "statusHint": "submitted"
                }))
            }),
        ))
        .await;

        let r = extract_remote(&payload(), &endpoint).await.unwrap();
        assert_eq!(r.job_title, "Backend Engineer");
        assert_eq!(r.company, "Globex");
        assert_eq!(r.status_hint, StatusHint::Submitted);
    }

    #[tokio::test]
    async fn server_error_is_none() {
        let endpoint = serve(Router::new().route(
            "/extract",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))) }),
        ))
        .await;
        assert!(extract_remote(&payload(), &endpoint).await.is_none());
    }

    #[tokio::test]
    async fn unparsable_body_is_none() {
        let endpoint = serve(Router::new().route("/extract", post(|| async { "not json at all" }))).await;
        assert!(extract_remote(&payload(), &endpoint).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_none() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let endpoint = format!("http://{}/extract", addr);
        assert!(extract_remote(&payload(), &endpoint).await.is_none());
    }
}
