use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::Html,
    Extension,
};

use crate::{
    commitish::{self, CommitishPath},
    dates::documentation_file_name,
    errors::{Result, ShelfError},
    git::{GitRepository, LogSpec},
    templates::{blame_to_array, commit_to_object},
};

use super::{
    locate_version, page_globals,
    params::{validate_version, Params, RepoName},
    AppState,
};

#[tracing::instrument(skip(state))]
pub(crate) async fn show(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Path(commitish_path): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>> {
    let repo = state.repos.open(&repo_name)?;
    render_blame(&state, &repo, &commitish_path)
}

/// Blame of the repository's documentation file as of the newest commit made
/// on `version`.
#[tracing::instrument(skip(state))]
pub(crate) async fn annotations(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Path(version): Path<String>,
    Query(params): Query<Params>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>> {
    let version = validate_version(&version)?;
    let repo = state.repos.open(&repo_name)?;
    let commit = locate_version(&state, &repo, version, params.page)?;

    let git_name = if repo_name.ends_with(".git") {
        repo_name.clone()
    } else {
        format!("{}.git", repo_name)
    };
    let path = format!("{}/{}", commit.hash, documentation_file_name(&git_name));
    render_blame(&state, &repo, &path)
}

fn render_blame(state: &AppState, repo: &GitRepository, commitish_path: &str) -> Result<Html<String>> {
    let head = repo.head();
    let CommitishPath { reference, file } = commitish::resolve(Some(commitish_path), &repo.refs()?, &head);
    if file.is_empty() {
        return Err(ShelfError::NotFound);
    }

    let commit = repo.commit(&reference)?;
    let blames = repo.blame(&LogSpec::new(reference.as_str(), Some(file.as_str())))?;

    let mut globals = page_globals(repo, &reference, "")?;
    globals.extend(liquid::object!({
        "page": "blame",
        "file": file,
        "commit": commit_to_object(&commit),
        "blames": blame_to_array(&blames),
    }));
    Ok(Html(state.templates.render("blame", &globals)?))
}
