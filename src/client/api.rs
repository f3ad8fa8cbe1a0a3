//! HTTP adapter over the GitLab v4 list endpoints

use std::time::Duration;

use chrono::Local;
use compact_str::{format_compact, CompactString};
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, instrument, trace, warn};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
};
use crate::{
    domain::{CommitDto, MergeRequestDto, ProjectDto},
    id::ProjectId,
    pagination::PageCursor,
};

#[derive(Debug, Clone)]
pub struct GitlabApi {
    client: Client,
    config: ClientConfig,
    base_url: CompactString,
}

/// Shapes GitLab uses for error bodies
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{"error": "insufficient_scope", "error_description": "..."}`
    OAuth {
        error: CompactString,
        error_description: Option<CompactString>,
    },
    /// `{"message": "404 Not found"}` or `{"message": {"base": ["..."]}}`
    Message { message: serde_json::Value },
}

impl ErrorBody {
    fn into_message(self) -> CompactString {
        match self {
            ErrorBody::OAuth { error, error_description: Some(description) } => {
                format_compact!("{error} {description}")
            },
            ErrorBody::OAuth { error, error_description: None } => error,
            ErrorBody::Message { message: serde_json::Value::String(s) } => s.into(),
            ErrorBody::Message { message } => format_compact!("{message}"),
        }
    }
}

impl GitlabApi {
    /// Fails on a malformed endpoint before any request is made.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url: CompactString = config.api_base_url()?.as_str().trim_end_matches('/').into();

        let client = Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(|e| ClientError::transport(base_url.clone(), e))?;

        Ok(Self { client, config, base_url })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API base URL, e.g. `https://gitlab.com/api/v4`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every project visible to the token. Pages are walked here, so callers
    /// get the complete list or an error.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<ProjectDto>> {
        let mut cursor = PageCursor::first(self.config.request.per_page);
        let mut projects = Vec::new();

        loop {
            let page: Vec<ProjectDto> = self.get(&self.projects_url(cursor)).await?;
            let last = cursor.is_last_page(page.len());
            projects.extend(page);

            if last {
                break;
            }
            cursor = cursor.next();
        }

        debug!(project_count = projects.len(), pages = cursor.api_page(), "Listed projects");
        Ok(projects)
    }

    /// One page of merge requests across every accessible project
    #[instrument(skip(self), fields(page = cursor.page))]
    pub async fn list_merge_requests(&self, cursor: PageCursor) -> Result<Vec<MergeRequestDto>> {
        self.get(&self.merge_requests_url(cursor)).await
    }

    /// One page of commits for a project, with line stats
    #[instrument(skip(self), fields(project_id = %project_id, page = cursor.page))]
    pub async fn list_commits(
        &self,
        project_id: ProjectId,
        cursor: PageCursor,
    ) -> Result<Vec<CommitDto>> {
        self.get(&self.commits_url(project_id, cursor)).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.token.as_str())
            .send()
            .await
            .map_err(|e| ClientError::transport(url, e))?;

        let path: CompactString = response.url().path().into();
        let page = response
            .url()
            .query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| CompactString::from(value.as_ref()));
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::transport(path.clone(), e))?;

        trace!(%path, status = status.as_u16(), bytes = body.len(), "Response received");
        if self.config.debug.dump_responses {
            self.dump_response(&path, page.as_deref(), &body);
        }

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| ClientError::decode(path, e))
        } else {
            Err(Self::status_error(status, &path, &body, retry_after))
        }
    }

    fn status_error(
        status: StatusCode,
        path: &str,
        body: &str,
        retry_after: Option<Duration>,
    ) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::not_found(path),
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited { retry_after },
            _ => {
                let message = serde_json::from_str::<ErrorBody>(body)
                    .map(ErrorBody::into_message)
                    .unwrap_or_else(|_| body.trim().into());
                ClientError::status(status.as_u16(), message)
            },
        }
    }

    fn projects_url(&self, cursor: PageCursor) -> CompactString {
        format_compact!(
            "{}/projects?simple=true&per_page={}&page={}",
            self.base_url,
            cursor.per_page,
            cursor.api_page()
        )
    }

    fn merge_requests_url(&self, cursor: PageCursor) -> CompactString {
        format_compact!(
            "{}/merge_requests?scope=all&per_page={}&page={}",
            self.base_url,
            cursor.per_page,
            cursor.api_page()
        )
    }

    fn commits_url(&self, project_id: ProjectId, cursor: PageCursor) -> CompactString {
        format_compact!(
            "{}/projects/{project_id}/repository/commits?with_stats=true&per_page={}&page={}",
            self.base_url,
            cursor.per_page,
            cursor.api_page()
        )
    }

    /// Best effort; failures are logged and otherwise ignored.
    fn dump_response(&self, path: &str, page: Option<&str>, body: &str) {
        let dir = &self.config.debug.dump_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "Unable to create response dump directory");
            return;
        }

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S%.3f").to_string();
        let file = dir.join(dump_file_name(&stamp, path, page));
        match std::fs::write(&file, body) {
            Ok(()) => debug!(file = %file.display(), "Response dumped"),
            Err(e) => warn!(file = %file.display(), error = %e, "Unable to dump response"),
        }
    }
}

/// `<stamp>_api_v4_projects_page2.json`; the page keeps consecutive pages of
/// one endpoint apart.
fn dump_file_name(stamp: &str, path: &str, page: Option<&str>) -> String {
    let path = path.trim_start_matches('/').replace('/', "_");
    match page {
        Some(page) => format!("{stamp}_{path}_page{page}.json"),
        None => format!("{stamp}_{path}.json"),
    }
}
