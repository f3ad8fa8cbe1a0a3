use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    client::{ClientConfig, ClientError, RequestConfig},
    collector::Collector,
    result::{CollectorError, Result},
};

pub const SAMPLE_CONFIG: &str = r#"## Reads merge request and commit activity exposed by the GitLab API.
##
## Endpoint:
## - only one URL is allowed; "/api/v4" is appended when missing
endpoint = "https://gitlab.com"
## Token:
## - personal access token (read_api scope required), sent as a bearer token
token = "abcd1234"
## Repos:
## - names of the projects to collect commits from
repos = ["abc", "def", "ghi"]
## Log level: trace, debug, info, warn, error or "Off" to disable file logs
# log_level = "info"
## Per-request timeout in seconds
# timeout_secs = 30
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Base URL of the GitLab instance
    pub endpoint: String,
    /// Personal access token, sent as a bearer token
    pub token: String,
    /// Project names to collect commits for
    #[serde(default, alias = "Repos")]
    pub repos: Vec<String>,
    /// Log level override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl CollectorConfig {
    /// Checks the fields needed before a client can be built. Endpoint
    /// syntax is checked later, when the collector starts.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> Result<()> {
            Err(CollectorError::Configuration(ClientError::invalid_config(field, reason)))
        };

        if self.endpoint.trim().is_empty() {
            return invalid("endpoint", "is required");
        }
        if self.token.trim().is_empty() {
            return invalid("token", "is required");
        }
        if self.timeout_secs == Some(0) {
            return invalid("timeout_secs", "must be greater than zero");
        }
        Ok(())
    }

    pub fn collector(&self, debug: bool) -> Collector {
        let client_config = ClientConfig::from(self).with_response_dumps(debug);
        Collector::new(client_config, self.repos.iter().map(String::as_str))
    }
}

impl From<&CollectorConfig> for ClientConfig {
    fn from(config: &CollectorConfig) -> Self {
        let mut request = RequestConfig::default();
        if let Some(secs) = config.timeout_secs {
            request.timeout = Duration::from_secs(secs);
        }

        ClientConfig::new(config.endpoint.trim(), config.token.trim()).with_request(request)
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("gitlab-metrics.toml")
    } else {
        PathBuf::from("gitlab-metrics.toml")
    }
}

pub fn load_config(path: &Path) -> Result<CollectorConfig> {
    confy::load_path(path).map_err(CollectorError::ConfigFile)
}
