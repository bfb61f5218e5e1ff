//! Runtime settings for the automation and inference providers
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! first) or from command line flags that shadow the same variables.

use crate::error::ConfigurationError;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.texau.com/api/v1";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Connection details for the automation provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    /// Workspace context header, optional
    pub context: Option<String>,
    /// Connected LinkedIn account every job runs under
    pub connected_account_id: String,
    pub timezone: String,
    /// Per-request HTTP timeout (not the polling budget)
    pub request_timeout: Duration,
}

impl ProviderSettings {
    /// Validate raw values. The API key and account id are required.
    pub fn new(
        api_key: Option<String>,
        connected_account_id: Option<String>,
        base_url: Option<String>,
        context: Option<String>,
        timezone: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let api_key = non_empty(api_key).ok_or(ConfigurationError::MissingSetting("TEXAU_API_KEY"))?;
        let connected_account_id = non_empty(connected_account_id)
            .ok_or(ConfigurationError::MissingSetting("TEXAU_ACCOUNT_ID"))?;

        let context = non_empty(context);
        if context.is_none() {
            warn!("TEXAU_CONTEXT not set, requests will use the key's default workspace");
        }

        Ok(ProviderSettings {
            base_url: non_empty(base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            context,
            connected_account_id,
            timezone: non_empty(timezone).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            request_timeout: Duration::from_secs(30),
        })
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        ProviderSettings::new(
            std::env::var("TEXAU_API_KEY").ok(),
            std::env::var("TEXAU_ACCOUNT_ID").ok(),
            std::env::var("TEXAU_BASE_URL").ok(),
            std::env::var("TEXAU_CONTEXT").ok(),
            std::env::var("TEXAU_TIMEZONE").ok(),
        )
    }
}

/// Connection details for the comment-generation endpoint
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
    /// Pause between consecutive generations
    pub pause: Duration,
}

impl InferenceSettings {
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Result<Self, ConfigurationError> {
        let endpoint = non_empty(endpoint).ok_or(ConfigurationError::MissingSetting("HF_ENDPOINT"))?;
        let token = non_empty(token).ok_or(ConfigurationError::MissingSetting("HF_TOKEN"))?;
        let token = token.strip_prefix("Bearer ").unwrap_or(&token).to_string();

        Ok(InferenceSettings {
            endpoint,
            token,
            timeout: Duration::from_secs(120),
            pause: Duration::from_millis(500),
        })
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        InferenceSettings::new(std::env::var("HF_ENDPOINT").ok(), std::env::var("HF_TOKEN").ok())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
