use std::{path::{Path, PathBuf}, fs, collections::HashMap};

use serde::Deserialize;

use crate::errors::{Result, ShelfError};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: ListenConfig,
    #[serde(default)]
    pub web: WebConfig,
    pub repos: HashMap<String, RepoConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListenConfig {
    pub address: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_per_page")]
    pub commits_per_page: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { commits_per_page: default_per_page() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RepoConfig {
    pub title: String,
    /// Upstream URL, shown in page headers.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_head")]
    pub head: String,
}

impl RepoConfig {
    /// Location on disk; `repos/<name>` with a `.git` suffix unless configured.
    pub fn location(&self, name: &str) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None if name.ends_with(".git") => Path::new("repos").join(name),
            None => Path::new("repos").join(format!("{}.git", name)),
        }
    }
}

fn default_head() -> String {
    "main".to_owned()
}

fn default_per_page() -> usize {
    15
}

pub fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if config.web.commits_per_page == 0 {
        return Err(ShelfError::InvalidConfig("web.commits_per_page must be at least 1".to_owned()));
    }
    if let Some(name) = config.repos.keys().find(|name| !is_route_name(name)) {
        return Err(ShelfError::InvalidConfig(format!("invalid repository name {:?}", name)));
    }
    // `<outer>/commits/...` and `<outer>/blame/...` belong to the outer repository.
    for outer in config.repos.keys() {
        let shadowed = config.repos.keys().find(|name| {
            name.strip_prefix(outer.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map_or(false, |rest| matches!(rest.split('/').next(), Some("commits" | "blame")))
        });
        if let Some(name) = shadowed {
            return Err(ShelfError::InvalidConfig(format!("repository name {:?} is shadowed by {:?}", name, outer)));
        }
    }
    Ok(config)
}

/// Repository names are mounted as URL prefixes: plain path segments of
/// ASCII letters, digits, `.`, `_` and `-`, and not under `/assets`.
fn is_route_name(name: &str) -> bool {
    name.split('/').all(|segment| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }) && name.split('/').next() != Some("assets")
}

pub(super) fn load(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        parse(&content)
    } else {
        Err(ShelfError::MissingConfig(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_filled_in() {
        let config = parse(r#"
            [server]
            address = "127.0.0.1:3000"

            [repos."codes/gitlist.git"]
            title = "GitList"
        "#).unwrap();

        assert_eq!(config.web.commits_per_page, 15);
        let repo = &config.repos["codes/gitlist.git"];
        assert_eq!(repo.head, "main");
        assert_eq!(repo.url, None);
        assert_eq!(repo.location("codes/gitlist.git"), Path::new("repos/codes/gitlist.git"));
        assert_eq!(repo.location("myrepo"), Path::new("repos/myrepo.git"));
    }

    #[test]
    fn explicit_values_win() {
        let config = parse(r#"
            [server]
            address = "0.0.0.0:80"

            [web]
            commits_per_page = 50

            [repos.docs]
            title = "Docs"
            path = "/srv/git/docs"
            head = "trunk"
            url = "https://example.org/docs.git"
        "#).unwrap();

        assert_eq!(config.web.commits_per_page, 50);
        let repo = &config.repos["docs"];
        assert_eq!(repo.head, "trunk");
        assert_eq!(repo.location("docs"), Path::new("/srv/git/docs"));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = parse(r#"
            [server]
            address = "127.0.0.1:3000"
            [web]
            commits_per_page = 0
            [repos]
        "#).unwrap_err();
        assert!(matches!(err, ShelfError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_names_that_cannot_be_routed() {
        for name in ["", "/docs", "docs/", "a//b", "my repo", "a:b", "*", "assets", "assets/x", "a/../b", "thèse"] {
            let content = format!("[server]\naddress = \"127.0.0.1:3000\"\n[repos.{:?}]\ntitle = \"x\"\n", name);
            assert!(matches!(parse(&content), Err(ShelfError::InvalidConfig(_))), "{:?} accepted", name);
        }
        for name in ["myrepo", "codes/gitlist.git", "a-b_c.d", "assets-archive"] {
            let content = format!("[server]\naddress = \"127.0.0.1:3000\"\n[repos.{:?}]\ntitle = \"x\"\n", name);
            assert!(parse(&content).is_ok(), "{:?} rejected", name);
        }
    }

    #[test]
    fn rejects_names_under_another_repositorys_routes() {
        let err = parse(r#"
            [server]
            address = "127.0.0.1:3000"
            [repos.codes]
            title = "Codes"
            [repos."codes/blame/x"]
            title = "Shadowed"
        "#).unwrap_err();
        assert!(matches!(err, ShelfError::InvalidConfig(_)));

        assert!(parse(r#"
            [server]
            address = "127.0.0.1:3000"
            [repos.codes]
            title = "Codes"
            [repos."codes/gitlist.git"]
            title = "GitList"
        "#).is_ok());
    }

    #[test]
    fn missing_file() {
        let err = load(Path::new("/nonexistent/gitshelf.toml")).unwrap_err();
        assert!(matches!(err, ShelfError::MissingConfig(_)));
    }
}
