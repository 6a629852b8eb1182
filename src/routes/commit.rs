use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::Html,
    Extension,
};

use crate::{
    errors::Result,
    git::GitRepository,
    templates::{commit_to_object, syntax_highlight},
};

use super::{
    locate_version, page_globals,
    params::{validate_commit, validate_version, Params, RepoName},
    AppState,
};

#[tracing::instrument(skip(state))]
pub(crate) async fn show(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Path(commit): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>> {
    let commit = validate_commit(&commit)?;
    let repo = state.repos.open(&repo_name)?;
    render_commit(&state, &repo, &commit)
}

/// The commit view of the newest commit made on `version`.
#[tracing::instrument(skip(state))]
pub(crate) async fn modifications(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Path(version): Path<String>,
    Query(params): Query<Params>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>> {
    let version = validate_version(&version)?;
    let repo = state.repos.open(&repo_name)?;
    let commit = locate_version(&state, &repo, version, params.page)?;
    render_commit(&state, &repo, &commit.hash)
}

fn render_commit(state: &AppState, repo: &GitRepository, commitish: &str) -> Result<Html<String>> {
    let commit = repo.commit(commitish)?;
    let (patch, stat) = repo.diff(&commit.hash)?;
    let diff = syntax_highlight("patch", &patch)?;

    let mut globals = page_globals(repo, &repo.head(), "")?;
    globals.extend(liquid::object!({
        "page": "commits",
        "commit": commit_to_object(&commit),
        "diff": diff,
        "stat": {
            "added": stat.added,
            "removed": stat.removed,
        },
    }));
    Ok(Html(state.templates.render("commit", &globals)?))
}
