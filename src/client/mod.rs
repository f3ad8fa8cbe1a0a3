//! GitLab client modules
//!
//! Configuration, the HTTP adapter over the GitLab v4 list endpoints, and
//! the errors they raise.

pub mod api;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use api::GitlabApi;
pub use config::{ClientConfig, DebugConfig, RequestConfig};
pub use error::{ClientError, Result};
