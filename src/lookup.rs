//! Project id <-> name lookup, built once per collection cycle

use std::collections::HashMap;

use compact_str::CompactString;
use tracing::{debug, error, info, instrument};

use crate::{
    client::GitlabApi,
    domain::Project,
    id::ProjectId,
    result::{CollectorError, Result},
};

/// Read-only after construction; shared between streams behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct ProjectLookup {
    names: HashMap<ProjectId, CompactString>,
    ids: HashMap<CompactString, ProjectId>,
}

impl ProjectLookup {
    /// Later entries replace earlier ones with the same id. When several
    /// projects share a name, the smallest id is the one `resolve` returns.
    pub fn from_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        let mut names = HashMap::new();
        for project in projects {
            names.insert(project.id, project.name);
        }

        let mut ids: HashMap<CompactString, ProjectId> = HashMap::with_capacity(names.len());
        for (id, name) in &names {
            ids.entry(name.clone())
                .and_modify(|existing| *existing = (*existing).min(*id))
                .or_insert(*id);
        }

        Self { names, ids }
    }

    /// Project name for `id`, or an empty string when the id is unknown.
    pub fn name_of(&self, id: ProjectId) -> &str {
        self.names.get(&id).map_or("", CompactString::as_str)
    }

    /// Project id for an exact name match.
    pub fn resolve(&self, name: &str) -> Option<ProjectId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Fetches every visible project and builds the lookup. Failure here is a
/// precondition error: nothing downstream can be tagged without it.
#[instrument(skip(api), fields(endpoint = %api.base_url()))]
pub async fn resolve_projects(api: &GitlabApi) -> Result<ProjectLookup> {
    info!("Resolving projects");

    match api.list_projects().await {
        Ok(projects) => {
            let lookup = ProjectLookup::from_projects(projects.into_iter().map(Project::from));
            debug!(project_count = lookup.len(), "Project lookup built");
            Ok(lookup)
        },
        Err(e) => {
            error!(error = %e, "Failed to list projects");
            Err(CollectorError::Precondition {
                endpoint: api.base_url().into(),
                source: e,
            })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: u64, name: &str) -> Project {
        Project { id: ProjectId::new(id), name: name.into() }
    }

    #[test]
    fn test_resolve_by_name() {
        let lookup = ProjectLookup::from_projects([project(1, "a"), project(2, "b")]);

        assert_eq!(lookup.resolve("b"), Some(ProjectId::new(2)));
        assert_eq!(lookup.resolve("c"), None);
        assert_eq!(lookup.name_of(ProjectId::new(1)), "a");
    }

    #[test]
    fn test_unknown_id_has_empty_name() {
        let lookup = ProjectLookup::from_projects([project(1, "a")]);
        assert_eq!(lookup.name_of(ProjectId::new(99)), "");
    }

    #[test]
    fn test_repeated_id_last_write_wins() {
        let lookup = ProjectLookup::from_projects([project(1, "old"), project(1, "new")]);

        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.name_of(ProjectId::new(1)), "new");
        assert_eq!(lookup.resolve("old"), None);
        assert_eq!(lookup.resolve("new"), Some(ProjectId::new(1)));
    }

    #[test]
    fn test_shared_name_resolves_to_smallest_id() {
        let lookup =
            ProjectLookup::from_projects([project(30, "api"), project(7, "api"), project(12, "api")]);
        assert_eq!(lookup.resolve("api"), Some(ProjectId::new(7)));
    }

    #[test]
    fn test_name_match_is_exact() {
        let lookup = ProjectLookup::from_projects([project(1, "Backend")]);
        assert_eq!(lookup.resolve("backend"), None);
        assert_eq!(lookup.resolve("Backend "), None);
    }
}
