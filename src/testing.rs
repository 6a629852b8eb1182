//! Throwaway repositories for tests.

use std::collections::HashMap;

use git2::{IndexEntry, IndexTime, Oid, Repository};
use tempfile::TempDir;

use crate::{
    config::{Config, ListenConfig, RepoConfig, WebConfig},
    git::{GitRepository, Repositories},
};

pub struct Fixture {
    pub name: String,
    pub dir: TempDir,
    pub repo: Repository,
}

impl Fixture {
    /// A repository whose HEAD points at the unborn branch `main`.
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/main").unwrap();
        Fixture { name: name.to_owned(), dir, repo }
    }

    pub fn config(&self) -> Config {
        let mut repos = HashMap::new();
        repos.insert(self.name.clone(), RepoConfig {
            title: "Test repository".to_owned(),
            url: None,
            path: Some(self.dir.path().to_owned()),
            head: "main".to_owned(),
        });
        Config {
            server: ListenConfig { address: "127.0.0.1:0".to_owned() },
            web: WebConfig { commits_per_page: 15 },
            repos,
        }
    }

    pub fn repositories(&self) -> Repositories {
        Repositories::new(&self.config())
    }

    pub fn open(&self) -> GitRepository {
        self.repositories().open(&self.name).unwrap()
    }

    /// Commits `files` on top of `branch` and returns the new commit id.
    /// `date` is RFC 3339 and used for both author and committer.
    pub fn commit(&self, branch: &str, files: &[(&str, &str)], message: &str, date: &str) -> String {
        let refname = format!("refs/heads/{}", branch);
        let parent = self
            .repo
            .find_reference(&refname)
            .ok()
            .map(|r| r.peel_to_commit().unwrap());

        let mut index = git2::Index::new().unwrap();
        if let Some(parent) = &parent {
            index.read_tree(&parent.tree().unwrap()).unwrap();
        }
        for (path, content) in files {
            let id = self.repo.blob(content.as_bytes()).unwrap();
            index.add(&IndexEntry {
                ctime: IndexTime::new(0, 0),
                mtime: IndexTime::new(0, 0),
                dev: 0,
                ino: 0,
                mode: 0o100644,
                uid: 0,
                gid: 0,
                file_size: content.len() as u32,
                id,
                flags: 0,
                flags_extended: 0,
                path: path.as_bytes().to_vec(),
            }).unwrap();
        }
        let tree = self.repo.find_tree(index.write_tree_to(&self.repo).unwrap()).unwrap();

        let when = chrono::DateTime::parse_from_rfc3339(date).unwrap();
        let time = git2::Time::new(when.timestamp(), when.offset().local_minus_utc() / 60);
        let sig = git2::Signature::new("Tester", "tester@example.org", &time).unwrap();

        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let id = self
            .repo
            .commit(Some(refname.as_str()), &sig, &sig, message, &tree, &parents)
            .unwrap();
        id.to_string()
    }

    pub fn branch(&self, name: &str, target: &str) {
        let commit = self.repo.find_commit(Oid::from_str(target).unwrap()).unwrap();
        self.repo.branch(name, &commit, false).unwrap();
    }

    pub fn tag(&self, name: &str, target: &str) {
        let object = self.repo.find_object(Oid::from_str(target).unwrap(), None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }
}
