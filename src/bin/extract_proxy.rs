use anyhow::Context;
use tracing::{info, warn};

use jobtrack::proxy::upstream::{UpstreamClient, API_KEY_ENV};
use jobtrack::proxy::{self, ProxyState};
use jobtrack::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = Settings::load().context("loading settings")?;
    let upstream = UpstreamClient::from_env(&settings);
    if upstream.is_none() {
        warn!("{} is not set; /extract will answer 500", API_KEY_ENV);
    }

    let app = proxy::router(ProxyState { upstream });
    let listener = tokio::net::TcpListener::bind(&settings.proxy_bind)
        .await
        .with_context(|| format!("binding {}", settings.proxy_bind))?;
    info!(
        addr = %settings.proxy_bind,
        model = %settings.upstream_model,
        "extract proxy listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
