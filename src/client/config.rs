//! Connection settings for the GitLab adapter

use std::{path::PathBuf, time::Duration};

use compact_str::{format_compact, CompactString};
use reqwest::Url;

use super::error::{ClientError, Result};
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Appended to endpoints that name only the GitLab host.
const API_PATH: &str = "/api/v4";

/// GitLab caps `per_page` at this value.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitLab instance URL, with or without the `/api/v4` suffix
    pub endpoint: CompactString,
    /// Sent as `Authorization: Bearer <token>`
    pub token: CompactString,
    pub request: RequestConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub per_page: u32,
    pub timeout: Duration,
}

/// Raw response bodies written to disk for troubleshooting.
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub dump_responses: bool,
    pub dump_dir: PathBuf,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { per_page: DEFAULT_PAGE_SIZE, timeout: Duration::from_secs(30) }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            dump_responses: false,
            dump_dir: PathBuf::from("gitlab-metrics-responses"),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<CompactString>, token: impl Into<CompactString>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.request.per_page = per_page;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    pub fn with_response_dumps(mut self, enabled: bool) -> Self {
        self.debug.dump_responses = enabled;
        self
    }

    /// Offline checks only; nothing here touches the network.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::invalid_config("endpoint", "must not be empty"));
        }
        self.api_base_url()?;

        if self.token.trim().is_empty() {
            return Err(ClientError::invalid_config("token", "must not be empty"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.request.per_page) {
            return Err(ClientError::invalid_config(
                "per_page",
                format_compact!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        if self.request.timeout.is_zero() {
            return Err(ClientError::invalid_config("timeout", "must be greater than zero"));
        }

        Ok(())
    }

    /// The endpoint as an API v4 base URL without a trailing slash, e.g.
    /// `https://gitlab.com` becomes `https://gitlab.com/api/v4`.
    pub fn api_base_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim();
        let mut url = Url::parse(endpoint).map_err(|_| ClientError::invalid_url(endpoint))?;

        match url.scheme() {
            "http" | "https" => {},
            other => {
                return Err(ClientError::invalid_config(
                    "endpoint",
                    format_compact!("unsupported scheme \"{other}\""),
                ))
            },
        }
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ClientError::invalid_url(endpoint));
        }

        let path = url.path().trim_end_matches('/').to_owned();
        if !path.ends_with(API_PATH) {
            url.set_path(&format!("{path}{API_PATH}"));
        } else {
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(url)
    }
}
