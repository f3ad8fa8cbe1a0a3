// GitLab API Documentation: https://docs.gitlab.com/ee/api/api_resources.html
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Deserialize;

use crate::id::ProjectId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDto {
    pub id: ProjectId,
    pub name: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDto {
    #[serde(default)]
    pub name: CompactString,
    #[serde(default)]
    pub username: CompactString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestDto {
    pub project_id: ProjectId,
    pub source_project_id: ProjectId,
    pub target_project_id: ProjectId,
    #[serde(default)]
    pub title: CompactString,
    #[serde(default)]
    pub state: CompactString,
    #[serde(default)]
    pub merge_status: CompactString,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    /// Reported as a string by GitLab, e.g. `"12"` or `"1000+"`.
    pub changes_count: Option<CompactString>,
    #[serde(default)]
    pub user_notes_count: i64,
    #[serde(default)]
    pub work_in_progress: bool,
    #[serde(default)]
    pub draft: bool,
    pub author: Option<UserDto>,
    pub assignee: Option<UserDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitStatsDto {
    pub additions: i64,
    pub deletions: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDto {
    pub id: CompactString,
    #[serde(default)]
    pub title: CompactString,
    #[serde(default)]
    pub message: CompactString,
    #[serde(default)]
    pub author_name: CompactString,
    #[serde(default)]
    pub author_email: CompactString,
    #[serde(default)]
    pub committer_name: CompactString,
    #[serde(default)]
    pub committer_email: CompactString,
    pub status: Option<CompactString>,
    pub stats: Option<CommitStatsDto>,
    pub created_at: DateTime<Utc>,
    pub committed_date: Option<DateTime<Utc>>,
}

impl MergeRequestDto {
    /// GitLab replaced `work_in_progress` with `draft`; either marks the MR as WIP.
    pub fn is_wip(&self) -> bool {
        self.work_in_progress || self.draft
    }
}

impl From<ProjectDto> for Project {
    fn from(p: ProjectDto) -> Self {
        Self { id: p.id, name: p.name }
    }
}
