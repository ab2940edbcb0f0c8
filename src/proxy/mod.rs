//! HTTP front for remote extraction: `POST /extract` forwards sanitized page
//! content to a language model and returns the four extraction fields.

pub mod upstream;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::clamp_chars;
use crate::escalation::{PAYLOAD_TEXT_MAX, PAYLOAD_TITLE_MAX, PAYLOAD_URL_MAX};
use crate::remote::RemoteExtractionPayload;
use upstream::{UpstreamClient, UpstreamError, DETAILS_MAX};

#[derive(Clone, Default)]
pub struct ProxyState {
    /// `None` when no upstream credential is configured.
    pub upstream: Option<UpstreamClient>,
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            "/extract",
            post(extract).options(preflight).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn preflight() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed() -> Response {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Validate and clamp a request body.
pub fn parse_request(body: &[u8]) -> Result<RemoteExtractionPayload, &'static str> {
    let value: Value = serde_json::from_slice(body).map_err(|_| "Invalid JSON body")?;
    let map = value.as_object().ok_or("Body must be a JSON object")?;
    let field = |key: &str, max: usize| {
        map.get(key)
            .and_then(Value::as_str)
            .map(|s| clamp_chars(s.trim(), max))
            .unwrap_or_default()
    };
    let payload = RemoteExtractionPayload {
        text: field("text", PAYLOAD_TEXT_MAX),
        url: field("url", PAYLOAD_URL_MAX),
        title: field("title", PAYLOAD_TITLE_MAX),
    };
    if payload.text.is_empty() && payload.title.is_empty() {
        return Err("Provide at least one of text or title");
    }
    Ok(payload)
}

async fn extract(State(state): State<Arc<ProxyState>>, body: Bytes) -> Response {
    let Some(upstream) = state.upstream.as_ref() else {
        warn!("extract called without upstream credential");
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server misconfigured: OPENAI_API_KEY is not set",
        );
    };

    let payload = match parse_request(&body) {
        Ok(p) => p,
        Err(msg) => return error(StatusCode::BAD_REQUEST, msg),
    };

    match upstream.extract(&payload).await {
        Ok(result) => Json(result).into_response(),
        Err(UpstreamError::Status { status, details }) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Upstream model call failed",
                "status": status,
                "details": details,
            })),
        )
            .into_response(),
        Err(UpstreamError::Transport(e)) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Upstream model call failed",
                "status": Value::Null,
                "details": clamp_chars(&e.to_string(), DETAILS_MAX),
            })),
        )
            .into_response(),
        Err(UpstreamError::Malformed(msg)) => {
            warn!(error = %msg, "upstream returned malformed output");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Malformed model output")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Response) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn mock_upstream(status: StatusCode, reply: Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let reply = reply.clone();
                async move { (status, Json(reply)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn with_upstream(base_url: &str) -> Router {
        router(ProxyState {
            upstream: Some(UpstreamClient::new("sk-test", base_url, "gpt-4o-mini")),
        })
    }

    fn assert_cors(response: &Response) {
        let h = response.headers();
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn preflight_ok() {
        let (status, response) = send(router(ProxyState::default()), "OPTIONS", "/extract", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        assert_eq!(json_body(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn wrong_path_and_method() {
        let (status, response) = send(router(ProxyState::default()), "POST", "/other", "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_cors(&response);
        assert_eq!(json_body(response).await["error"], "Not found");

        let (status, response) = send(router(ProxyState::default()), "GET", "/extract", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&response);
    }

    #[tokio::test]
    async fn missing_credential_fails_fast() {
        let (status, response) =
            send(router(ProxyState::default()), "POST", "/extract", r#"{"text":"hello"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
    }

    #[tokio::test]
    async fn bad_requests() {
        let app = with_upstream("http://127.0.0.1:9");
        for body in ["", "not json", "[1]", r#"{"url":"https://a.test"}"#, r#"{"text":"  ","title":""}"#] {
            let (status, _) = send(app.clone(), "POST", "/extract", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {:?}", body);
        }
    }

    #[tokio::test]
    async fn forwards_and_normalises() {
        let content = json!({
            "jobTitle": "Backend Engineer",
            "company": "g".repeat(300),
            "location": "Remote",
            "statusHint": "Submitted!"
        })
        .to_string();
        let base = mock_upstream(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": content}}]}),
        )
        .await;

        let (status, response) = send(
            with_upstream(&base),
            "POST",
            "/extract",
            r#"{"text":"We are hiring a Backend Engineer","url":"https://globex.test","title":"Jobs"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        let body = json_body(response).await;
        assert_eq!(body["jobTitle"], "Backend Engineer");
        assert_eq!(body["company"].as_str().unwrap().len(), 120);
        assert_eq!(body["statusHint"], "unknown");
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let base = mock_upstream(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "x".repeat(2000)}}),
        )
        .await;
        let (status, response) =
            send(with_upstream(&base), "POST", "/extract", r#"{"title":"Jobs"}"#).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["status"], 429);
        assert!(body["details"].as_str().unwrap().chars().count() <= DETAILS_MAX);
    }

    #[tokio::test]
    async fn malformed_model_output_is_500() {
        let base = mock_upstream(
            StatusCode::OK,
            json!({"choices": [{"message": {"content": "I think the title is Engineer"}}]}),
        )
        .await;
        let (status, _) = send(with_upstream(&base), "POST", "/extract", r#"{"text":"x"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn request_fields_are_clamped() {
        let body = json!({"text": "t".repeat(20_000), "title": "x".repeat(400), "url": 5}).to_string();
        let p = parse_request(body.as_bytes()).unwrap();
        assert_eq!(p.text.len(), PAYLOAD_TEXT_MAX);
        assert_eq!(p.title.len(), PAYLOAD_TITLE_MAX);
        assert_eq!(p.url, "");
    }
}
