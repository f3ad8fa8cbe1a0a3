use compact_str::CompactString;
use confy::ConfyError;
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, CollectorError>;

#[derive(Debug, Error)]
pub enum CollectorError {
    /// Endpoint or credentials rejected before any request was made.
    #[error("invalid configuration: {0}")]
    Configuration(#[source] ClientError),

    /// The project list could not be fetched, so nothing can be tagged.
    #[error("unable to list projects on \"{endpoint}\"")]
    Precondition {
        endpoint: CompactString,
        #[source]
        source: ClientError,
    },

    #[error("repository \"{name}\" does not exist in the project list")]
    UnknownRepository { name: CompactString },

    #[error("unable to list {stream} (page {page})")]
    PageFailed {
        stream: CompactString,
        page: u32,
        #[source]
        source: ClientError,
    },

    #[error("cannot {operation} a collector that is {state}")]
    InvalidState { operation: &'static str, state: &'static str },

    #[error("failure reading configuration file")]
    ConfigFile(#[source] ConfyError),
}

impl CollectorError {
    pub fn unknown_repository(name: impl Into<CompactString>) -> Self {
        Self::UnknownRepository { name: name.into() }
    }
}
