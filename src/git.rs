use std::{collections::{BTreeMap, BTreeSet}, path::Path};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use git2::{BlameOptions, BranchType, DiffFormat, DiffOptions, Oid, Repository, Sort};

use crate::{
    config::{Config, RepoConfig},
    dates::{DateField, Dated},
    errors::{Result, ShelfError},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CommitInfo {
    pub hash: String,
    pub short_hash: String,
    pub summary: String,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    pub author_date: DateTime<FixedOffset>,
    pub committer_date: DateTime<FixedOffset>,
    pub parents: Vec<String>,
}

impl CommitInfo {
    fn from_commit(commit: &git2::Commit) -> Self {
        let hash = commit.id().to_string();
        let short_hash = hash[..7].to_owned();
        let full_message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
        let (summary, message) = full_message
            .split_once('\n')
            .unwrap_or((full_message.as_str(), ""));

        CommitInfo {
            short_hash,
            summary: summary.trim_end().to_owned(),
            message: message.trim().to_owned(),
            author: signature(&commit.author()),
            committer: signature(&commit.committer()),
            author_date: to_datetime(commit.author().when()),
            committer_date: to_datetime(commit.committer().when()),
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            hash,
        }
    }
}

impl Dated for CommitInfo {
    fn date(&self, field: DateField) -> NaiveDate {
        match field {
            DateField::Author => self.author_date.date_naive(),
            DateField::Committer => self.committer_date.date_naive(),
        }
    }
}

fn signature(sig: &git2::Signature) -> Signature {
    Signature {
        name: sig.name().map(|s| s.to_owned()),
        email: sig.email().map(|s| s.to_owned()),
    }
}

/// Keeps the offset the commit was recorded with, so a commit made shortly
/// before midnight local time lands in that local day.
fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(&offset)
}

/// A reference, optionally narrowed to the history of one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSpec {
    pub reference: String,
    pub file: Option<String>,
}

impl LogSpec {
    pub fn new(reference: impl Into<String>, file: Option<&str>) -> Self {
        Self {
            reference: reference.into(),
            file: file.filter(|f| !f.is_empty()).map(|f| f.to_owned()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlameHunk {
    pub commit: CommitInfo,
    /// 1-based line number of the first line.
    pub start_line: usize,
    pub lines: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub added: usize,
    pub removed: usize,
}

/// The configured repositories, addressed by their URL name.
#[derive(Clone, Debug)]
pub struct Repositories {
    repos: BTreeMap<String, RepoConfig>,
}

impl Repositories {
    pub fn new(config: &Config) -> Self {
        Self {
            repos: config.repos.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repos.keys().map(|k| k.as_str())
    }

    #[tracing::instrument(skip(self))]
    pub fn open(&self, name: &str) -> Result<GitRepository> {
        let config = self.repos.get(name).ok_or(ShelfError::NotFound)?;
        let repo = Repository::open(config.location(name))
            .map_err(|e| {
                match e.code() {
                    git2::ErrorCode::NotFound => ShelfError::NotFound,
                    _ => e.into(),
                }
            })?;
        Ok(GitRepository {
            name: name.to_owned(),
            config: config.clone(),
            repo,
            #[cfg(test)]
            walks: Default::default(),
        })
    }
}

pub struct GitRepository {
    name: String,
    config: RepoConfig,
    repo: Repository,
    #[cfg(test)]
    walks: std::cell::Cell<usize>,
}

/// The commit ids of one history walk, newest first. Pages are cut from the
/// ids without walking again.
pub struct History<'r> {
    repo: &'r Repository,
    ids: Vec<Oid>,
}

impl History<'_> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn page(&self, page: usize, per_page: usize) -> Result<Vec<CommitInfo>> {
        self.ids
            .iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .map(|id| Ok(CommitInfo::from_commit(&self.repo.find_commit(*id)?)))
            .collect()
    }
}

impl GitRepository {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// The checked-out branch, or the configured head when HEAD is unborn or
    /// detached.
    pub fn head(&self) -> String {
        match self.repo.head() {
            Ok(head) if head.is_branch() => head
                .shorthand()
                .map(|s| s.to_owned())
                .unwrap_or_else(|| self.config.head.clone()),
            _ => self.config.head.clone(),
        }
    }

    pub fn branches(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.insert(name.to_owned());
            }
        }
        Ok(names)
    }

    pub fn tags(&self) -> Result<BTreeSet<String>> {
        Ok(self.repo.tag_names(None)?.iter().flatten().map(|s| s.to_owned()).collect())
    }

    /// Every branch and tag name.
    pub fn refs(&self) -> Result<BTreeSet<String>> {
        let mut refs = self.branches()?;
        refs.extend(self.tags()?);
        Ok(refs)
    }

    fn find_commit(&self, commitish: &str) -> Result<git2::Commit<'_>> {
        self.repo
            .revparse_single(commitish)
            .and_then(|object| object.peel_to_commit())
            .map_err(ShelfError::from_lookup)
    }

    #[tracing::instrument(skip(self), fields(repo = %self.name))]
    pub fn commit(&self, commitish: &str) -> Result<CommitInfo> {
        Ok(CommitInfo::from_commit(&self.find_commit(commitish)?))
    }

    /// Commit ids reachable from the reference, newest first. With a file,
    /// only commits that changed it relative to every parent are kept.
    fn history(&self, spec: &LogSpec) -> Result<Vec<Oid>> {
        #[cfg(test)]
        self.walks.set(self.walks.get() + 1);

        let start = self.find_commit(&spec.reference)?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(start.id())?;
        revwalk.set_sorting(Sort::TIME)?;

        let mut ids = Vec::new();
        for id in revwalk {
            let id = id?;
            match &spec.file {
                Some(file) => {
                    if self.touches(&self.repo.find_commit(id)?, Path::new(file))? {
                        ids.push(id);
                    }
                }
                None => ids.push(id),
            }
        }
        Ok(ids)
    }

    fn touches(&self, commit: &git2::Commit, path: &Path) -> Result<bool> {
        let own = entry_id(commit, path)?;
        if commit.parent_count() == 0 {
            return Ok(own.is_some());
        }
        for parent in commit.parents() {
            if entry_id(&parent, path)? == own {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Walks the history once; count and pages come from the result.
    #[tracing::instrument(skip(self), fields(repo = %self.name))]
    pub fn log(&self, spec: &LogSpec) -> Result<History<'_>> {
        Ok(History { repo: &self.repo, ids: self.history(spec)? })
    }

    /// Whether `file` exists in the tree of `commitish`.
    pub fn contains_file(&self, commitish: &str, file: &str) -> Result<bool> {
        Ok(entry_id(&self.find_commit(commitish)?, Path::new(file))?.is_some())
    }

    #[cfg(test)]
    pub(crate) fn history_walks(&self) -> usize {
        self.walks.get()
    }

    /// Commits on `reference` whose message contains `query`, ignoring case.
    #[tracing::instrument(skip(self), fields(repo = %self.name))]
    pub fn search_commit_log(&self, query: &str, reference: &str) -> Result<Vec<CommitInfo>> {
        let needle = query.to_lowercase();
        let mut found = Vec::new();
        for id in self.history(&LogSpec::new(reference, None))? {
            let commit = self.repo.find_commit(id)?;
            if String::from_utf8_lossy(commit.message_bytes()).to_lowercase().contains(&needle) {
                found.push(CommitInfo::from_commit(&commit));
            }
        }
        Ok(found)
    }

    /// Line attribution of `spec.file` as of `spec.reference`. Adjacent hunks
    /// from the same commit are merged.
    #[tracing::instrument(skip(self), fields(repo = %self.name))]
    pub fn blame(&self, spec: &LogSpec) -> Result<Vec<BlameHunk>> {
        let file = spec.file.as_deref().ok_or(ShelfError::NotFound)?;
        let path = Path::new(file);
        let commit = self.find_commit(&spec.reference)?;
        let blob = commit
            .tree()?
            .get_path(path)
            .map_err(ShelfError::from_lookup)?
            .to_object(&self.repo)?
            .peel_to_blob()
            .map_err(|_| ShelfError::NotFound)?;
        let content = String::from_utf8_lossy(blob.content()).into_owned();
        let lines: Vec<&str> = content.lines().collect();

        let mut opts = BlameOptions::new();
        opts.newest_commit(commit.id());
        let blame = self.repo.blame_file(path, Some(&mut opts))?;

        let mut hunks: Vec<BlameHunk> = Vec::new();
        for hunk in blame.iter() {
            let start_line = hunk.final_start_line();
            let text = lines
                .iter()
                .skip(start_line.saturating_sub(1))
                .take(hunk.lines_in_hunk())
                .map(|l| l.to_string());
            let id = hunk.final_commit_id();
            if let Some(last) = hunks.last_mut().filter(|last| last.commit.hash == id.to_string()) {
                last.lines.extend(text);
                continue;
            }
            let commit = CommitInfo::from_commit(&self.repo.find_commit(id)?);
            hunks.push(BlameHunk { commit, start_line, lines: text.collect() });
        }
        Ok(hunks)
    }

    /// Patch of a commit against its first parent, plus line counts.
    #[tracing::instrument(skip(self), fields(repo = %self.name))]
    pub fn diff(&self, commitish: &str) -> Result<(String, DiffStat)> {
        let commit = self.find_commit(commitish)?;
        let diff = self.makediff(&commit)?;
        let mut output = String::new();
        let mut stat = DiffStat::default();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            match origin {
                '+' => stat.added += 1,
                '-' => stat.removed += 1,
                _ => {}
            }
            if matches!(origin, '+' | '-' | ' ') {
                output.push(origin);
            }
            output.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok((output, stat))
    }

    fn makediff(&self, commit: &git2::Commit) -> Result<git2::Diff<'_>> {
        let mut diffopts = DiffOptions::new();
        let a = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };
        let b = commit.tree()?;
        Ok(self.repo.diff_tree_to_tree(a.as_ref(), Some(&b), Some(&mut diffopts))?)
    }
}

fn entry_id(commit: &git2::Commit, path: &Path) -> Result<Option<Oid>> {
    match commit.tree()?.get_path(path) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
