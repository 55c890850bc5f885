use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://a.klaviyo.com/api/";
pub const DEFAULT_REVISION: &str = "2025-07-15";
pub const DEFAULT_API_KEY_ENV: &str = "KLAVIYO_API_KEY";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("base_url must be an absolute http(s) URL, got {0}")]
    InvalidBaseUrl(String),
    #[error("revision cannot be empty")]
    EmptyRevision,
    #[error("api_key_env cannot be empty")]
    EmptyApiKeyEnv,
    #[error("timeout_secs cannot be 0")]
    InvalidTimeout,
}

/// Connection settings for the platform API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Root of the REST API. Resource paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Value of the `revision` header pinning the API version.
    #[serde(default = "default_revision")]
    pub revision: String,
    /// Name of the environment variable holding the private API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout. Unset keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base() {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.to_string()));
        }
        if self.revision.trim().is_empty() {
            return Err(ValidationError::EmptyRevision);
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ValidationError::EmptyApiKeyEnv);
        }
        if self.timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            revision: default_revision(),
            api_key_env: default_api_key_env(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base url is valid")
}

fn default_revision() -> String {
    DEFAULT_REVISION.into()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.into()
}
