//! Request parameters and their validators.

use axum::http::HeaderMap;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    dates::DATE_FORMAT,
    errors::{Result, ShelfError},
};

/// Query string of GET requests and form body of the search POST.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Params {
    pub query: Option<String>,
    pub page: Option<usize>,
}

/// Configuration key of the repository a route was registered for.
#[derive(Clone, Debug)]
pub(crate) struct RepoName(pub String);

/// `name` with `.git` removed, or added when it has none.
pub fn alternative_spelling(name: &str) -> String {
    match name.strip_suffix(".git") {
        Some(stem) => stem.to_owned(),
        None => format!("{}.git", name),
    }
}

/// Requests made by the listing's "more" button only want the list itself.
pub fn is_fragment(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .map_or(false, |v| v.as_bytes().eq_ignore_ascii_case(b"XMLHttpRequest"))
}

fn is_version_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// A `YYYY-MM-DD` segment. Anything not shaped like one is not a date route
/// at all; a well-shaped but impossible date is a bad request.
pub fn validate_version(s: &str) -> Result<NaiveDate> {
    if !is_version_shaped(s) {
        return Err(ShelfError::NotFound);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ShelfError::BadRequest(format!("invalid date {:?}", s)))
}

pub fn validate_commit(s: &str) -> Result<String> {
    if !s.is_empty() && s.chars().all(|c| matches!(c, 'a'..='f' | '0'..='9' | '^')) {
        Ok(s.to_owned())
    } else {
        Err(ShelfError::BadRequest(format!("invalid commit {:?}", s)))
    }
}

pub fn validate_branch(s: &str) -> Result<String> {
    let valid = !s.is_empty()
        && !s.starts_with('/')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'));
    if valid {
        Ok(s.to_owned())
    } else {
        Err(ShelfError::BadRequest(format!("invalid branch {:?}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings() {
        assert_eq!(alternative_spelling("myrepo"), "myrepo.git");
        assert_eq!(alternative_spelling("codes/gitlist.git"), "codes/gitlist");
    }

    #[test]
    fn fragment_header() {
        let mut headers = HeaderMap::new();
        assert!(!is_fragment(&headers));
        headers.insert("x-requested-with", "xmlhttprequest".parse().unwrap());
        assert!(is_fragment(&headers));
        headers.insert("x-requested-with", "fetch".parse().unwrap());
        assert!(!is_fragment(&headers));
    }

    #[test]
    fn versions() {
        assert_eq!(validate_version("2024-01-10").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!(matches!(validate_version("2024-13-01"), Err(ShelfError::BadRequest(_))));
        assert!(matches!(validate_version("2024-02-30"), Err(ShelfError::BadRequest(_))));
        assert!(matches!(validate_version("2024-1-10"), Err(ShelfError::NotFound)));
        assert!(matches!(validate_version("latest"), Err(ShelfError::NotFound)));
    }

    #[test]
    fn commits() {
        assert_eq!(validate_commit("abc^").unwrap(), "abc^");
        assert!(validate_commit("").is_err());
        assert!(validate_commit("zz").is_err());
        assert!(validate_commit("ABC").is_err());
    }

    #[test]
    fn branches() {
        assert!(validate_branch("feature/x-1.2_b").is_ok());
        assert!(validate_branch("").is_err());
        assert!(validate_branch("/main").is_err());
        assert!(validate_branch("a;b").is_err());
        assert!(validate_branch("a b").is_err());
    }

    #[test]
    fn branches_are_ascii_only() {
        assert!(validate_branch("café").is_err());
        assert!(validate_branch("ветка").is_err());
        assert!(validate_branch("v٣").is_err());
    }
}
