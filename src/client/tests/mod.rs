//! Test utilities and common test fixtures for client modules

use serde_json::json;


/// Create JSON representation of a project
pub fn project_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "path_with_namespace": format!("group/{name}"),
        "web_url": format!("https://gitlab.example.com/group/{name}")
    })
}

/// Create JSON representation of a merge request; `n` makes each one distinct
pub fn merge_request_json(n: usize, project_id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": 1000 + n,
        "iid": n,
        "project_id": project_id,
        "source_project_id": project_id,
        "target_project_id": project_id,
        "title": title,
        "state": "merged",
        "merge_status": "can_be_merged",
        "upvotes": n,
        "downvotes": 0,
        "changes_count": "3",
        "user_notes_count": 1,
        "work_in_progress": false,
        "draft": false,
        "author": { "name": "Jane Doe", "username": "jdoe" },
        "assignee": null,
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": "2023-01-02T00:00:00Z"
    })
}

/// Create JSON representation of a commit with stats
pub fn commit_json(n: usize) -> serde_json::Value {
    json!({
        "id": format!("{n:040x}"),
        "short_id": format!("{n:08x}"),
        "title": format!("Commit {n}"),
        "message": format!("Commit {n}\n"),
        "author_name": "Example User",
        "author_email": "user@example.com",
        "committer_name": "Example User",
        "committer_email": "user@example.com",
        "created_at": "2023-01-01T00:00:00Z",
        "committed_date": "2023-01-01T00:00:00Z",
        "stats": { "additions": 10, "deletions": 2, "total": 12 },
        "status": null
    })
}

/// `count` merge requests numbered from `start`, all in `project_id`
pub fn merge_requests_page(start: usize, count: usize, project_id: u64) -> serde_json::Value {
    let items: Vec<_> = (start..start + count)
        .map(|n| merge_request_json(n, project_id, &format!("feature/ABC-{:03}: change {n}", n % 1000)))
        .collect();
    json!(items)
}

/// `count` commits numbered from `start`
pub fn commits_page(start: usize, count: usize) -> serde_json::Value {
    let items: Vec<_> = (start..start + count).map(commit_json).collect();
    json!(items)
}

/// Create GitLab API error response
pub fn gitlab_error_response(error: &str, description: Option<&str>) -> serde_json::Value {
    let mut json = json!({
        "error": error
    });

    if let Some(desc) = description {
        json["error_description"] = json!(desc);
    }

    json
}

/// Create GitLab API error response (format 2)
pub fn gitlab_error_response_2(message: &str) -> serde_json::Value {
    json!({
        "message": message
    })
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> crate::client::config::ClientConfig {
        crate::client::config::ClientConfig::new(self.base_url(), "test-token")
    }
}

#[allow(clippy::module_inception)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_pages() {
        let page = merge_requests_page(0, 3, 7);
        assert_eq!(page.as_array().unwrap().len(), 3);
        assert_eq!(page[2]["title"], "feature/ABC-002: change 2");

        let page = commits_page(5, 2);
        assert_eq!(page[0]["id"].as_str().unwrap().len(), 40);
    }

    #[test]
    fn test_error_responses() {
        let error1 = gitlab_error_response("invalid_token", Some("Token is invalid"));
        assert_eq!(error1["error"], "invalid_token");
        assert_eq!(error1["error_description"], "Token is invalid");

        let error2 = gitlab_error_response_2("Project not found");
        assert_eq!(error2["message"], "Project not found");
    }
}
