use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clamp_chars;
use crate::remote::{RemoteExtractionPayload, RemoteExtractionResponse};
use crate::settings::Settings;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DETAILS_MAX: usize = 500;

const SYSTEM_PROMPT: &str = "You extract job application details from web page content. \
Respond with a single JSON object with exactly these keys: \
\"jobTitle\" (string), \"company\" (string), \"location\" (string), \"statusHint\" (string). \
\"statusHint\" must be exactly \"submitted\" if the page confirms an application was submitted, \
otherwise exactly \"unknown\". Use an empty string for any field you cannot determine. \
Do not guess, do not add other keys, do not add commentary.";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}")]
    Status { status: u16, details: String },
    #[error("malformed model output: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponseRaw {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client used by the proxy.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl UpstreamClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// `None` when the credential is unset or blank.
    pub fn from_env(settings: &Settings) -> Option<Self> {
        let key = std::env::var(API_KEY_ENV).ok()?;
        if key.trim().is_empty() {
            return None;
        }
        Some(Self::new(
            key.trim(),
            settings.upstream_base_url.as_str(),
            settings.upstream_model.as_str(),
        ))
    }

    pub async fn extract(
        &self,
        request: &RemoteExtractionPayload,
    ) -> Result<RemoteExtractionResponse, UpstreamError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: user_prompt(request),
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            warn!(status = %status, "upstream model call failed");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                details: clamp_chars(&details, DETAILS_MAX),
            });
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| UpstreamError::Malformed("no message content".into()))?;
        debug!(model = %self.model, "upstream model answered");
        parse_model_output(&content)
    }
}

fn user_prompt(request: &RemoteExtractionPayload) -> String {
    format!(
        "Page URL: {}\nPage title: {}\n\nPage text:\n{}",
        request.url, request.title, request.text
    )
}

/// The model's content must itself be a JSON object.
pub fn parse_model_output(content: &str) -> Result<RemoteExtractionResponse, UpstreamError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    let map = value
        .as_object()
        .ok_or_else(|| UpstreamError::Malformed("output is not a JSON object".into()))?;
    Ok(RemoteExtractionResponse::from_object(map))
}
