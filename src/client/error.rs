//! Errors raised by the GitLab adapter

use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected before any request was sent
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: CompactString },

    #[error("\"{url}\" is not a usable GitLab endpoint")]
    InvalidUrl { url: CompactString },

    /// Connection, TLS or timeout failure
    #[error("request to {path} failed")]
    Transport {
        path: CompactString,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx response whose body is not the expected JSON
    #[error("unexpected response body from {path}")]
    Decode {
        path: CompactString,
        #[source]
        source: serde_json::Error,
    },

    #[error("GitLab rejected the token")]
    Unauthorized,

    #[error("{path} not found")]
    NotFound { path: CompactString },

    #[error("rate limited by GitLab (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-2xx response
    #[error("GitLab responded with HTTP {status}: {message}")]
    Status { status: u16, message: CompactString },
}

impl ClientError {
    pub fn invalid_config(field: &'static str, reason: impl Into<CompactString>) -> Self {
        Self::InvalidConfig { field, reason: reason.into() }
    }

    pub fn invalid_url(url: impl Into<CompactString>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn transport(path: impl Into<CompactString>, source: reqwest::Error) -> Self {
        Self::Transport { path: path.into(), source }
    }

    pub fn decode(path: impl Into<CompactString>, source: serde_json::Error) -> Self {
        Self::Decode { path: path.into(), source }
    }

    pub fn not_found(path: impl Into<CompactString>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn status(status: u16, message: impl Into<CompactString>) -> Self {
        Self::Status { status, message: message.into() }
    }

    /// Whether the same request could succeed later. Pages are never
    /// retried; this only feeds the logs.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            ClientError::RateLimited { .. } => true,
            ClientError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
