use chrono::NaiveDate;

use crate::errors::{Result, ShelfError};

/// Date format of bucket keys and of the `{version}` URL parameter.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateField {
    Author,
    Committer,
}

pub trait Dated {
    fn date(&self, field: DateField) -> NaiveDate;
}

#[derive(Clone, Debug)]
pub struct Bucket<C> {
    pub date: String,
    pub commits: Vec<C>,
}

/// Commits grouped by calendar day.
///
/// Buckets keep the order in which their date first appeared, and commits
/// keep their source order inside a bucket. With a newest-first log the first
/// commit of a bucket is the most recent one of that day.
#[derive(Clone, Debug)]
pub struct CategorizedCommits<C> {
    buckets: Vec<Bucket<C>>,
}

impl<C: Dated> CategorizedCommits<C> {
    pub fn by_date(commits: impl IntoIterator<Item = C>, field: DateField) -> Self {
        let mut buckets: Vec<Bucket<C>> = Vec::new();
        for commit in commits {
            let date = commit.date(field).format(DATE_FORMAT).to_string();
            match buckets.iter_mut().find(|b| b.date == date) {
                Some(bucket) => bucket.commits.push(commit),
                None => buckets.push(Bucket { date, commits: vec![commit] }),
            }
        }
        Self { buckets }
    }
}

impl<C> CategorizedCommits<C> {
    pub fn buckets(&self) -> &[Bucket<C>] {
        &self.buckets
    }

    /// The first commit recorded for `date`.
    pub fn locate(&self, date: &str) -> Result<&C> {
        self.buckets
            .iter()
            .find(|b| b.date == date)
            .and_then(|b| b.commits.first())
            .ok_or(ShelfError::NotFound)
    }
}

/// Name of the documentation file that goes with a repository:
/// `codes/my-thésis.git` becomes `My_thesis.md`.
///
/// The replacements run in order, each over the output of the previous one.
/// Only an ASCII first letter is upper-cased.
pub fn documentation_file_name(repo: &str) -> String {
    const REPLACEMENTS: [(&str, &str); 4] = [
        ("codes/", ""),
        (".git", ".md"),
        ("é", "e"),
        ("-", "_"),
    ];

    let name = REPLACEMENTS
        .into_iter()
        .fold(repo.to_owned(), |acc, (from, to)| acc.replace(from, to));

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => std::iter::once(first.to_ascii_uppercase()).chain(chars).collect(),
        None => String::new(),
    }
}
