use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query},
    http::HeaderMap,
    response::Html,
    Extension,
};

use crate::{
    commitish::{self, CommitishPath},
    dates::{CategorizedCommits, DateField},
    errors::{Result, ShelfError},
    git::LogSpec,
    pager::Pager,
    templates::categorized_to_array,
};

use super::{
    page_globals,
    params::{is_fragment, validate_branch, Params, RepoName},
    AppState,
};

/// History of the head branch.
#[tracing::instrument(skip(state, headers))]
pub(crate) async fn index(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>> {
    list(&state, &repo_name, None, params.page, is_fragment(&headers))
}

/// History of a ref, or of one file on it. `search` in place of the ref
/// searches the head branch.
#[axum_macros::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub(crate) async fn log(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Path(commitish_path): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>> {
    if commitish_path.trim_matches('/') == "search" {
        let head = state.repos.open(&repo_name)?.head();
        return render_search(&state, &repo_name, &head, params.query.as_deref());
    }
    list(&state, &repo_name, Some(&commitish_path), params.page, is_fragment(&headers))
}

/// `POST <branch>/search` with the query in the form body.
#[axum_macros::debug_handler]
#[tracing::instrument(skip(state))]
pub(crate) async fn search(
    Extension(RepoName(repo_name)): Extension<RepoName>,
    Path(branch_search): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Form(params): Form<Params>,
) -> Result<Html<String>> {
    let branch = branch_search
        .trim_start_matches('/')
        .strip_suffix("/search")
        .ok_or(ShelfError::NotFound)?;
    let branch = validate_branch(branch)?;
    render_search(&state, &repo_name, &branch, params.query.as_deref())
}

fn list(
    state: &AppState,
    repo_name: &str,
    commitish_path: Option<&str>,
    page: Option<usize>,
    fragment: bool,
) -> Result<Html<String>> {
    let repo = state.repos.open(repo_name)?;
    let head = repo.head();
    let CommitishPath { reference, file } = commitish::resolve(commitish_path, &repo.refs()?, &head);
    if !file.is_empty() && !repo.contains_file(&reference, &file)? {
        return Err(ShelfError::NotFound);
    }

    let history = repo.log(&LogSpec::new(reference.as_str(), Some(file.as_str())))?;
    let pager = Pager::new(page, history.len(), state.per_page);
    let commits = history.page(pager.current, state.per_page)?;
    let categorized = CategorizedCommits::by_date(commits, DateField::Committer);

    let mut globals = page_globals(&repo, &reference, "")?;
    globals.extend(liquid::object!({
        "page": "commits",
        "pager": pager,
        "commits": categorized_to_array(&categorized),
        "file": file,
    }));

    let template = if fragment { "commits_list" } else { "commits" };
    Ok(Html(state.templates.render(template, &globals)?))
}

fn render_search(state: &AppState, repo_name: &str, branch: &str, query: Option<&str>) -> Result<Html<String>> {
    let repo = state.repos.open(repo_name)?;
    let query = query.unwrap_or_default();
    let commits = repo.search_commit_log(query, branch)?;
    let categorized = CategorizedCommits::by_date(commits, DateField::Committer);

    let mut globals = page_globals(&repo, branch, query)?;
    globals.extend(liquid::object!({
        "page": "searchcommits",
        "file": "",
        "commits": categorized_to_array(&categorized),
    }));
    Ok(Html(state.templates.render("search_commits", &globals)?))
}
