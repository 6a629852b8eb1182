use std::{collections::BTreeSet, sync::Arc};

use axum::{
    routing::get,
    Extension, Router,
};
use chrono::NaiveDate;

use crate::{
    commitish,
    config::Config,
    dates::{CategorizedCommits, DateField, DATE_FORMAT},
    errors::{Result, ShelfError},
    git::{CommitInfo, GitRepository, LogSpec, Repositories},
    pager::Pager,
    templates::Templates,
};

mod assets;
mod blame;
mod commit;
mod commits;
pub mod params;

use params::RepoName;

/// Everything a handler needs, handed to it explicitly.
pub struct AppState {
    pub repos: Repositories,
    pub templates: Templates,
    pub per_page: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            repos: Repositories::new(config),
            templates: Templates::load()?,
            per_page: config.web.commits_per_page,
        })
    }
}

/// One set of routes per configured repository, mounted under its name.
/// The date routes are also reachable with `.git` added or removed, unless
/// that spelling is itself a configured name.
pub fn build_router(state: Arc<AppState>) -> Router {
    let names: BTreeSet<&str> = state.repos.names().collect();
    let mut router = Router::new().route("/assets/*path", get(assets::get));
    for name in &names {
        router = router.nest(&format!("/{}", name), repository_routes(name));

        let alternative = params::alternative_spelling(name);
        if !names.contains(alternative.as_str()) {
            let dates = date_routes().layer(Extension(RepoName(name.to_string())));
            router = router.nest(&format!("/{}", alternative), dates);
        }
    }
    router.layer(Extension(state))
}

fn repository_routes(name: &str) -> Router {
    Router::new()
        .route("/commits", get(commits::index))
        .route("/commits/*commitish_path", get(commits::log).post(commits::search))
        .route("/commit/:commit", get(commit::show))
        .route("/blame/*commitish_path", get(blame::show))
        .merge(date_routes())
        .layer(Extension(RepoName(name.to_owned())))
}

fn date_routes() -> Router {
    Router::new()
        .route("/:version/modifications", get(commit::modifications))
        .route("/:version/annotations", get(blame::annotations))
}

/// Variables every page template reads: the repository, the current
/// branch, the ref lists and the search box contents.
fn page_globals(repo: &GitRepository, branch: &str, query: &str) -> Result<liquid::Object> {
    let branches = repo.branches()?;
    let tags = repo.tags()?;
    Ok(liquid::object!({
        "repo": {
            "name": repo.name(),
            "title": repo.config().title,
            "url": repo.config().url,
        },
        "branch": branch,
        "branches": branches,
        "tags": tags,
        "query": query,
    }))
}

/// Most recent commit on the head branch authored on `version`.
///
/// Starts at `page` and walks forward through the remaining pages of a single
/// history walk; only when none of them has a commit for that day is the date
/// reported as missing.
fn locate_version(state: &AppState, repo: &GitRepository, version: NaiveDate, page: Option<usize>) -> Result<CommitInfo> {
    let head = repo.head();
    let target = commitish::resolve(Some(head.as_str()), &repo.refs()?, &head);
    let history = repo.log(&LogSpec::new(target.reference.as_str(), target.file()))?;
    let pager = Pager::new(page, history.len(), state.per_page);
    let date = version.format(DATE_FORMAT).to_string();

    for page in pager.remaining() {
        let commits = history.page(page, state.per_page)?;
        match CategorizedCommits::by_date(commits, DateField::Author).locate(&date) {
            Ok(commit) => return Ok(commit.clone()),
            Err(ShelfError::NotFound) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(ShelfError::NotFound)
}
