use config::{Config, Environment, File};
use serde::Deserialize;

use crate::escalation::DEFAULT_THRESHOLD;
use crate::Result;

pub const ENV_PREFIX: &str = "JOBTRACK";
pub const DEFAULT_CONFIG_FILE: &str = "jobtrack";

/// Runtime settings: defaults, then `jobtrack.toml` (or `$JOBTRACK_CONFIG`),
/// then `JOBTRACK_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub ai_endpoint: Option<String>,
    pub escalation_enabled: bool,
    pub confidence_threshold: f64,
    pub db_path: String,
    pub proxy_bind: String,
    pub upstream_base_url: String,
    pub upstream_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_endpoint: None,
            escalation_enabled: true,
            confidence_threshold: DEFAULT_THRESHOLD,
            db_path: "data/jobtrack.sqlite".into(),
            proxy_bind: "127.0.0.1:8787".into(),
            upstream_base_url: "https://api.openai.com/v1".into(),
            upstream_model: "gpt-4o-mini".into(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let file = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Config::builder().add_source(File::with_name(&file).required(false)))
    }

    fn load_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let d = Settings::default();
        let settings = builder
            .set_default("escalation_enabled", d.escalation_enabled)?
            .set_default("confidence_threshold", d.confidence_threshold)?
            .set_default("db_path", d.db_path)?
            .set_default("proxy_bind", d.proxy_bind)?
            .set_default("upstream_base_url", d.upstream_base_url)?
            .set_default("upstream_model", d.upstream_model)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The endpoint to escalate to, if escalation is on and one is set.
    pub fn remote_endpoint(&self) -> Option<&str> {
        if !self.escalation_enabled {
            return None;
        }
        self.ai_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    pub fn remote_configured(&self) -> bool {
        self.remote_endpoint().is_some()
    }
}
