//! Lifecycle of the collection streams
//!
//! A [`Collector`] resolves the project list, then runs one merge request
//! stream and one commit stream per configured repository, each on its own
//! task. Stopping cancels a shared token and joins every stream.

use std::{future::Future, sync::Arc};

use compact_str::{format_compact, CompactString};
use itertools::Itertools;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    client::{ClientConfig, GitlabApi},
    id::ProjectId,
    lookup::{resolve_projects, ProjectLookup},
    metric::Accumulator,
    pagination::{walk_pages, StreamContext, WalkSummary},
    record::{COMMITS, MERGE_REQUESTS},
    result::{CollectorError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl CollectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorState::Idle => "idle",
            CollectorState::Starting => "starting",
            CollectorState::Running => "running",
            CollectorState::Stopping => "stopping",
            CollectorState::Stopped => "stopped",
        }
    }
}

pub struct Collector {
    config: ClientConfig,
    repos: Vec<CompactString>,
    state: CollectorState,
    cancel: CancellationToken,
    streams: JoinSet<WalkSummary>,
}

impl Collector {
    pub fn new<S>(config: ClientConfig, repos: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<CompactString>,
    {
        Self {
            config,
            repos: repos.into_iter().map(Into::into).collect(),
            state: CollectorState::Idle,
            cancel: CancellationToken::new(),
            streams: JoinSet::new(),
        }
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Token shared with the streams of the current cycle. Cancelling it has
    /// the same effect on the streams as [`Collector::stop`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of streams launched by the current cycle that have not been joined.
    pub fn active_streams(&self) -> usize {
        self.streams.len()
    }

    /// Validates the endpoint, resolves projects and launches the streams.
    /// Configuration and project-list failures are returned here and leave
    /// the collector idle; anything after that goes to `accumulator`.
    #[instrument(skip_all, fields(endpoint = %self.config.endpoint))]
    pub async fn start(&mut self, accumulator: Arc<dyn Accumulator>) -> Result<()> {
        if !matches!(self.state, CollectorState::Idle | CollectorState::Stopped) {
            return Err(CollectorError::InvalidState {
                operation: "start",
                state: self.state.as_str(),
            });
        }
        self.state = CollectorState::Starting;

        let api = match GitlabApi::new(self.config.clone()) {
            Ok(api) => Arc::new(api),
            Err(e) => {
                error!(error = %e, "Invalid endpoint configuration");
                self.state = CollectorState::Idle;
                return Err(CollectorError::Configuration(e));
            },
        };

        let lookup = match resolve_projects(&api).await {
            Ok(lookup) => Arc::new(lookup),
            Err(e) => {
                self.state = CollectorState::Idle;
                return Err(e);
            },
        };
        if lookup.is_empty() {
            warn!("No projects visible to the configured token");
        }

        let commit_streams = self.resolve_repositories(&lookup, accumulator.as_ref());

        self.cancel = CancellationToken::new();
        self.spawn_merge_requests(&api, &lookup, &accumulator);
        for (repo, project_id) in commit_streams {
            self.spawn_commits(&api, &lookup, &accumulator, repo, project_id);
        }

        self.state = CollectorState::Running;
        info!(streams = self.streams.len(), "Collector running");
        Ok(())
    }

    /// Cancels every stream and waits until all of them have exited.
    /// Does nothing unless the collector is running.
    #[instrument(skip_all)]
    pub async fn stop(&mut self) -> Vec<WalkSummary> {
        if self.state != CollectorState::Running {
            debug!(state = self.state.as_str(), "Stop ignored");
            return Vec::new();
        }

        self.state = CollectorState::Stopping;
        info!(streams = self.streams.len(), "Stopping collector");
        self.cancel.cancel();

        self.wait().await
    }

    /// Joins the streams, or stops them through [`Collector::stop`] if
    /// `shutdown` completes before they drain. Summaries of streams that
    /// finished before the shutdown are kept.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Vec<WalkSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut summaries = Vec::with_capacity(self.streams.len());
        loop {
            tokio::select! {
                joined = self.streams.join_next() => match joined {
                    Some(joined) => collect_summary(joined, &mut summaries),
                    None => break,
                },
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    summaries.extend(self.stop().await);
                    return summaries;
                },
            }
        }

        summaries.extend(self.wait().await);
        summaries
    }

    /// Joins every stream without cancelling them.
    pub async fn wait(&mut self) -> Vec<WalkSummary> {
        let mut summaries = Vec::with_capacity(self.streams.len());
        while let Some(joined) = self.streams.join_next().await {
            collect_summary(joined, &mut summaries);
        }

        if matches!(self.state, CollectorState::Running | CollectorState::Stopping) {
            self.state = CollectorState::Stopped;
            info!(streams = summaries.len(), "Collector stopped");
        }
        summaries
    }

    /// Pairs each distinct configured repository with its project id.
    /// Unknown names are reported and left out.
    fn resolve_repositories(
        &self,
        lookup: &ProjectLookup,
        accumulator: &dyn Accumulator,
    ) -> Vec<(CompactString, ProjectId)> {
        self.repos
            .iter()
            .unique()
            .filter_map(|repo| match lookup.resolve(repo) {
                Some(project_id) => Some((repo.clone(), project_id)),
                None => {
                    warn!(repository = %repo, "Repository not found, skipping its commits");
                    accumulator.report_error(CollectorError::unknown_repository(repo.clone()));
                    None
                },
            })
            .collect()
    }

    fn spawn_merge_requests(
        &mut self,
        api: &Arc<GitlabApi>,
        lookup: &Arc<ProjectLookup>,
        accumulator: &Arc<dyn Accumulator>,
    ) {
        let api = Arc::clone(api);
        let lookup = Arc::clone(lookup);
        let accumulator = Arc::clone(accumulator);
        let cancel = self.cancel.clone();

        self.streams.spawn(async move {
            let ctx = StreamContext {
                name: MERGE_REQUESTS.into(),
                per_page: api.config().request.per_page,
                cancel: &cancel,
                lookup: &lookup,
                accumulator: accumulator.as_ref(),
            };
            walk_pages(ctx, |cursor| api.list_merge_requests(cursor)).await
        });
    }

    fn spawn_commits(
        &mut self,
        api: &Arc<GitlabApi>,
        lookup: &Arc<ProjectLookup>,
        accumulator: &Arc<dyn Accumulator>,
        repo: CompactString,
        project_id: ProjectId,
    ) {
        let api = Arc::clone(api);
        let lookup = Arc::clone(lookup);
        let accumulator = Arc::clone(accumulator);
        let cancel = self.cancel.clone();

        debug!(repository = %repo, project_id = %project_id, "Launching commit stream");
        self.streams.spawn(async move {
            let ctx = StreamContext {
                name: format_compact!("{COMMITS}:{repo}"),
                per_page: api.config().request.per_page,
                cancel: &cancel,
                lookup: &lookup,
                accumulator: accumulator.as_ref(),
            };
            walk_pages(ctx, |cursor| api.list_commits(project_id, cursor)).await
        });
    }
}

fn collect_summary(
    joined: std::result::Result<WalkSummary, JoinError>,
    summaries: &mut Vec<WalkSummary>,
) {
    match joined {
        Ok(summary) => summaries.push(summary),
        Err(e) => error!(error = %e, "Stream task failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::metric::CollectorEvent;

    fn accumulator() -> (Arc<dyn Accumulator>, mpsc::Receiver<CollectorEvent>) {
        let (sender, receiver) = mpsc::channel::<CollectorEvent>();
        (Arc::new(sender), receiver)
    }

    #[tokio::test]
    async fn test_invalid_endpoint_fails_start() {
        let mut collector =
            Collector::new(ClientConfig::new("not a url", "token"), ["core"]);
        let (acc, receiver) = accumulator();

        let result = collector.start(acc).await;

        assert!(matches!(result, Err(CollectorError::Configuration(_))));
        assert_eq!(collector.state(), CollectorState::Idle);
        assert_eq!(collector.active_streams(), 0);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let mut collector =
            Collector::new(ClientConfig::new("https://gitlab.example.com", "token"), Vec::<String>::new());

        assert!(collector.stop().await.is_empty());
        assert_eq!(collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_unknown_repositories_are_reported_once() {
        use crate::domain::Project;

        let collector = Collector::new(
            ClientConfig::new("https://gitlab.example.com", "token"),
            ["a", "b", "c", "b", "c"],
        );
        let lookup = ProjectLookup::from_projects([
            Project { id: ProjectId::new(1), name: "a".into() },
            Project { id: ProjectId::new(2), name: "b".into() },
        ]);
        let (acc, receiver) = accumulator();

        let resolved = collector.resolve_repositories(&lookup, acc.as_ref());

        assert_eq!(
            resolved,
            vec![("a".into(), ProjectId::new(1)), ("b".into(), ProjectId::new(2))]
        );

        let errors: Vec<_> = receiver.try_iter().collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CollectorEvent::Error(CollectorError::UnknownRepository { name }) if name == "c"
        ));
    }
}
