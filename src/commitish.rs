//! Splitting of `<ref>/<file path>` URL segments.
//!
//! Branch and tag names may themselves contain slashes, so a segment such as
//! `release/v2/src/main.rs` can only be split once the repository's refs are
//! known. The longest known ref that is a whole-segment prefix wins.

use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitishPath {
    pub reference: String,
    pub file: String,
}

impl CommitishPath {
    pub fn file(&self) -> Option<&str> {
        if self.file.is_empty() {
            None
        } else {
            Some(self.file.as_str())
        }
    }
}

pub fn is_commit_hash(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Splits `path` into a ref and a file path.
///
/// An absent or empty path resolves to `head`. A full commit hash as first
/// segment is taken as the ref without consulting `known_refs`. When no known
/// ref matches, the first segment is used as the ref anyway.
pub fn resolve(path: Option<&str>, known_refs: &BTreeSet<String>, head: &str) -> CommitishPath {
    let path = path.map(|p| p.trim_matches('/')).unwrap_or_default();
    if path.is_empty() {
        return CommitishPath { reference: head.to_owned(), file: String::new() };
    }

    let segments: Vec<&str> = path.split('/').collect();
    if is_commit_hash(segments[0]) {
        return split_at(&segments, 1);
    }

    (1..=segments.len())
        .rev()
        .find(|&n| known_refs.contains(&segments[..n].join("/")))
        .map(|n| split_at(&segments, n))
        .unwrap_or_else(|| split_at(&segments, 1))
}

fn split_at(segments: &[&str], n: usize) -> CommitishPath {
    CommitishPath {
        reference: segments[..n].join("/"),
        file: segments[n..].join("/"),
    }
}
