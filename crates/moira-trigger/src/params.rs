//! Desired-state document: the parameter set of one invocation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use moira_client::{AuthConfig, TriggerSource, TriggerType, TtlState, Weekday};
use serde::{Deserialize, Serialize};
use url::Url;

/// Prefix of environment variables overriding document fields,
/// e.g. `MOIRA_TRIGGER__TTL=300`.
pub const ENV_PREFIX: &str = "MOIRA_TRIGGER";

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("failed to load parameters: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid parameters: {0}")]
    Invalid(String),
}

/// Whether the trigger should exist after the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Desired {
    Present,
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Base URL of the Moira API.
    pub api_url: String,
    #[serde(default)]
    pub auth_custom: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub auth_user: Option<String>,
    #[serde(default)]
    pub auth_pass: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    pub state: Desired,
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub targets: Vec<String>,
    #[serde(default)]
    pub warn_value: Option<f64>,
    #[serde(default)]
    pub error_value: Option<f64>,
    #[serde(default)]
    pub trigger_type: Option<TriggerType>,
    #[serde(default)]
    pub expression: String,
    #[serde(default = "default_ttl")]
    pub ttl: i64,
    #[serde(default)]
    pub ttl_state: TtlState,
    /// Legacy switch, superseded by `trigger_source`.
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub trigger_source: Option<TriggerSource>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub mute_new_metrics: bool,
    #[serde(default)]
    pub disabled_days: BTreeSet<Weekday>,
    #[serde(default)]
    pub timezone_offset: i64,
    #[serde(default)]
    pub start_hour: u32,
    #[serde(default)]
    pub start_minute: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    #[serde(default = "default_end_minute")]
    pub end_minute: u32,
    #[serde(default)]
    pub alone_metrics: Option<BTreeMap<String, bool>>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ttl() -> i64 {
    600
}

fn default_end_hour() -> u32 {
    23
}

fn default_end_minute() -> u32 {
    59
}

impl TriggerParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| ParamsError::Invalid(format!("api_url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ParamsError::Invalid("api_url must use http or https".into()));
        }
        if self.id.trim().is_empty() {
            return Err(ParamsError::Invalid("id must not be empty".into()));
        }
        if self.auth_user.is_some() != self.auth_pass.is_some() {
            return Err(ParamsError::Invalid(
                "auth_user and auth_pass must be set together".into(),
            ));
        }
        if self.ttl < 0 {
            return Err(ParamsError::Invalid("ttl must be >= 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ParamsError::Invalid("timeout_secs must be > 0".into()));
        }
        for (key, hour) in [("start_hour", self.start_hour), ("end_hour", self.end_hour)] {
            if hour > 23 {
                return Err(ParamsError::Invalid(format!("{key} must be in 0..=23")));
            }
        }
        for (key, minute) in [
            ("start_minute", self.start_minute),
            ("end_minute", self.end_minute),
        ] {
            if minute > 59 {
                return Err(ParamsError::Invalid(format!("{key} must be in 0..=59")));
            }
        }
        Ok(())
    }

    /// Auth options handed to the API client.
    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            custom: self.auth_custom.clone().unwrap_or_default(),
            user: self.auth_user.clone(),
            password: self.auth_pass.clone(),
            login: self.login.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Loads and validates the desired-state document at `path`.
///
/// The format (JSON, YAML, TOML) follows the file extension. Environment
/// variables prefixed with [`ENV_PREFIX`] and `__` override document fields.
pub fn load_params(path: &Path) -> Result<TriggerParams, ParamsError> {
    let cfg = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;
    let params: TriggerParams = cfg.try_deserialize()?;
    params.validate()?;
    tracing::debug!(trigger_id = %params.id, state = ?params.state, "parameters loaded");
    Ok(params)
}
