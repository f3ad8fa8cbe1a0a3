//! Collects merge request and commit activity from a GitLab instance and
//! hands it to a metrics pipeline as tagged, timestamped measurements.

pub mod client;
pub mod collector;
pub mod config;
pub mod domain;
pub mod id;
pub mod logging;
pub mod lookup;
pub mod metric;
pub mod output;
pub mod pagination;
pub mod record;
pub mod result;
pub mod ticket;
