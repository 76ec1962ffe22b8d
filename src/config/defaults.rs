use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{DEFAULT_TIMEOUT_SECS, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub protocol: String,
    pub format: String,
    pub token: String,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "api.factopedia.org".to_string(),
            protocol: "https".to_string(),
            format: "json".to_string(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_attempts: 2,
            retry_delay_secs: 2,
        }
    }
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// `<protocol>://<host>/`, the root every resource path is joined onto.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}://{}/", self.protocol, self.host.trim_end_matches('/')))
    }

    pub fn content_type(&self) -> String {
        format!("application/{}", self.format)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    pub fn apply_token(&mut self, token: Option<&str>) {
        if let Some(token) = token {
            self.token = token.to_string();
        }
    }

    pub fn apply_host(&mut self, host: Option<&str>) {
        if let Some(host) = host {
            self.host = host.to_string();
        }
    }
}
