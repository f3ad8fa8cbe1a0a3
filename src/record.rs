//! Normalization of API records into measurements

use crate::{
    domain::{CommitDto, MergeRequestDto},
    lookup::ProjectLookup,
    metric::Measurement,
    ticket,
};

pub const MERGE_REQUESTS: &str = "merge_requests";
pub const COMMITS: &str = "commits";

/// Conversion of one API item into the measurement handed to the accumulator.
pub trait Normalize {
    fn normalize(self, lookup: &ProjectLookup) -> Measurement;
}

impl Normalize for MergeRequestDto {
    fn normalize(self, lookup: &ProjectLookup) -> Measurement {
        let wip = self.is_wip();
        let author = self.author.unwrap_or_default();
        let assignee = self.assignee.unwrap_or_default();

        let mut m = Measurement::new(MERGE_REQUESTS, self.created_at)
            .field("upvotes", self.upvotes)
            .field("downvotes", self.downvotes)
            .field("changes", self.changes_count.unwrap_or_default())
            .field("notes_count", self.user_notes_count)
            .field("wip", wip)
            .tag("merge_status", self.merge_status)
            .tag("author", author.name)
            .tag("username", author.username)
            .tag("assignee", assignee.name)
            .tag("project", lookup.name_of(self.project_id))
            .tag("source_project", lookup.name_of(self.source_project_id))
            .tag("target_project", lookup.name_of(self.target_project_id))
            .tag("state", self.state)
            .tag("jira_ticket_id", ticket::ticket_id(&self.title))
            .tag("merge_request_type", ticket::classify_type(&self.title));

        if let Some(updated_at) = self.updated_at {
            m = m.field("updated_at", updated_at);
        }
        m
    }
}

impl Normalize for CommitDto {
    fn normalize(self, _lookup: &ProjectLookup) -> Measurement {
        let stats = self.stats.unwrap_or_default();

        let mut m = Measurement::new(COMMITS, self.created_at)
            .field("stats_additions", stats.additions)
            .field("stats_deletions", stats.deletions)
            .field("stats_total", stats.total)
            .field("message", self.message)
            .tag("id", self.id)
            .tag("title", self.title)
            .tag("author_name", self.author_name)
            .tag("author_email", self.author_email)
            .tag("committer_name", self.committer_name)
            .tag("committer_email", self.committer_email);

        if let Some(status) = self.status {
            m = m.field("status", status);
        }
        if let Some(committed_at) = self.committed_date {
            m = m.field("committed_at", committed_at);
        }
        m
    }
}
