use tracing::info;

use crate::escalation::{build_payload, should_escalate_with, DEFAULT_THRESHOLD};
use crate::extract::{extract_local, ExtractionResult};
use crate::merge::merge;
use crate::page::PageSignal;
use crate::remote::{RemoteClient, RemoteExtractionPayload};
use crate::settings::Settings;

/// The synchronous half of a pass: local result plus, when escalation is
/// warranted, the payload to send.
#[derive(Debug, Clone)]
pub struct Pass {
    pub local: ExtractionResult,
    pub payload: Option<RemoteExtractionPayload>,
}

pub struct Pipeline {
    remote: Option<RemoteClient>,
    threshold: f64,
}

impl Pipeline {
    pub fn new(endpoint: Option<&str>, threshold: f64) -> Self {
        Self {
            remote: endpoint.map(RemoteClient::new),
            threshold,
        }
    }

    pub fn local_only() -> Self {
        Self::new(None, DEFAULT_THRESHOLD)
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.remote_endpoint(), settings.confidence_threshold)
    }

    pub fn remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn prepare(&self, page: &dyn PageSignal) -> Pass {
        let local = extract_local(page);
        let payload = if should_escalate_with(&local, self.remote_configured(), self.threshold) {
            build_payload(page)
        } else {
            None
        };
        Pass { local, payload }
    }

    /// Runs the remote call if one was prepared and merges its answer.
    pub async fn finish(&self, pass: Pass) -> ExtractionResult {
        let remote = match (&self.remote, &pass.payload) {
            (Some(client), Some(payload)) => client.extract(payload).await,
            _ => None,
        };
        let result = merge(pass.local, remote.as_ref());
        info!(
            source = result.source.as_str(),
            confidence = result.confidence,
            likely_applied = result.likely_applied,
            escalated = pass.payload.is_some(),
            "extraction pass complete"
        );
        result
    }

    pub async fn run(&self, page: &dyn PageSignal) -> ExtractionResult {
        let pass = self.prepare(page);
        self.finish(pass).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::extract::Source;
    use crate::page::StaticPage;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/extract", addr)
    }

    fn counting_endpoint(hits: Arc<AtomicUsize>, reply: Value) -> Router {
        Router::new().route(
            "/extract",
            post(move || {
                let hits = hits.clone();
                let reply = reply.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(reply)
                }
            }),
        )
    }

    fn weak_page() -> StaticPage {
        StaticPage::new()
            .with_url("https://globex.test/jobs/7")
            .with_body("Join our backend team. Contact hr@globex.test")
    }

    #[tokio::test]
    async fn weak_local_result_is_filled_remotely() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = serve(counting_endpoint(
            hits.clone(),
            json!({"jobTitle": "Backend Engineer", "company": "Globex", "location": "", "statusHint": "unknown"}),
        ))
        .await;

        let pipeline = Pipeline::new(Some(&endpoint), DEFAULT_THRESHOLD);
        let pass = pipeline.prepare(&weak_page());
        assert_eq!(pass.local.job_title, "");
        assert!(pass.payload.as_ref().unwrap().text.contains("[email redacted]"));

        let r = pipeline.finish(pass).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(r.job_title, "Backend Engineer");
        assert_eq!(r.company, "Globex");
        assert_eq!(r.location, "");
        assert_eq!(r.source, Source::Remote);
    }

    #[tokio::test]
    async fn remote_failure_degrades_to_local() {
        let endpoint = serve(Router::new().route(
            "/extract",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let page = weak_page();
        let expected = extract_local(&page);
        let r = Pipeline::new(Some(&endpoint), DEFAULT_THRESHOLD).run(&page).await;
        assert_eq!(r, expected);
    }

    #[tokio::test]
    async fn structured_page_never_calls_remote() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = serve(counting_endpoint(hits.clone(), json!({"jobTitle": "Nope"}))).await;
        let page = StaticPage::new()
            .with_block(r#"{"@type":"JobPosting","title":"Data Engineer","hiringOrganization":{"name":"Acme"},"jobLocation":{"address":{"addressLocality":"Austin","addressRegion":"TX"}}}"#)
            .with_body("some text");
        let r = Pipeline::new(Some(&endpoint), DEFAULT_THRESHOLD).run(&page).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(r.source, Source::Structured);
        assert_eq!(r.location, "Austin, TX");
    }

    #[tokio::test]
    async fn selector_only_page_is_confident_locally() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = serve(counting_endpoint(hits.clone(), json!({"jobTitle": "Nope"}))).await;
        let page = StaticPage::new()
            .with_text("h1", "Site Reliability Engineer")
            .with_text(".topcard__org-name-link", "Globex");
        let r = Pipeline::new(Some(&endpoint), DEFAULT_THRESHOLD).run(&page).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(r.source, Source::Heuristic);
        assert_eq!(r.job_title, "Site Reliability Engineer");
        assert_eq!(r.company, "Globex");
    }

    #[tokio::test]
    async fn attribute_only_page_keeps_local_fields() {
        let page = StaticPage::new()
            .with_attr("[data-job-title]", "data-job-title", "Payroll Analyst")
            .with_attr("[data-company-name]", "data-company-name", "Umbrella");
        let r = Pipeline::local_only().run(&page).await;
        assert_eq!(r.job_title, "Payroll Analyst");
        assert_eq!(r.company, "Umbrella");
        assert_eq!(r.source, Source::Heuristic);
    }

    #[tokio::test]
    async fn local_only_never_escalates() {
        let pipeline = Pipeline::local_only();
        let pass = pipeline.prepare(&weak_page());
        assert!(pass.payload.is_none());
        let r = pipeline.finish(pass).await;
        assert_eq!(r.source, Source::Heuristic);
    }

    #[test]
    fn from_settings_respects_switch() {
        let mut settings = Settings {
            ai_endpoint: Some("https://x.test/extract".into()),
            ..Settings::default()
        };
        assert!(Pipeline::from_settings(&settings).remote_configured());
        settings.escalation_enabled = false;
        assert!(!Pipeline::from_settings(&settings).remote_configured());
    }
}
