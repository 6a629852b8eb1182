use std::collections::HashMap;

use liquid::{Object, Template};
use syntect::{parsing::SyntaxSet, highlighting::ThemeSet};

use crate::{
    dates::CategorizedCommits,
    errors::{Result, ShelfError},
    git::{BlameHunk, CommitInfo},
};

const SOURCES: [(&str, &str); 5] = [
    ("commits", include_str!("routes/templates/commits.html.liquid")),
    ("commits_list", include_str!("routes/templates/commits_list.html.liquid")),
    ("search_commits", include_str!("routes/templates/search_commits.html.liquid")),
    ("commit", include_str!("routes/templates/commit.html.liquid")),
    ("blame", include_str!("routes/templates/blame.html.liquid")),
];

const PARTIALS: [(&str, &str); 3] = [
    ("header", include_str!("routes/templates/partials/header.html.liquid")),
    ("footer", include_str!("routes/templates/partials/footer.html.liquid")),
    ("commit_buckets", include_str!("routes/templates/partials/commit_buckets.html.liquid")),
];

/// Parsed page templates, looked up by name.
pub struct Templates {
    templates: HashMap<&'static str, Template>,
}

impl Templates {
    pub fn load() -> Result<Self> {
        let mut partials = liquid::partials::InMemorySource::new();
        for (name, source) in PARTIALS {
            partials.add(name, source);
        }
        let parser = liquid::ParserBuilder::with_stdlib()
            .partials(liquid::partials::EagerCompiler::new(partials))
            .build()?;

        let mut templates = HashMap::new();
        for (name, source) in SOURCES {
            templates.insert(name, parser.parse(source)?);
        }
        Ok(Self { templates })
    }

    #[tracing::instrument(skip(self, globals))]
    pub fn render(&self, name: &str, globals: &Object) -> Result<String> {
        let template = self.templates.get(name).ok_or(ShelfError::NotFound)?;
        Ok(template.render(globals)?)
    }
}

#[tracing::instrument(skip(code))]
pub fn syntax_highlight(extension: &str, code: &str) -> Result<String> {
    let ss = SyntaxSet::load_defaults_newlines();
    let ts = ThemeSet::load_defaults();
    let theme = &ts.themes["base16-ocean.dark"];
    let syntax = ss.find_syntax_by_extension(extension).unwrap_or_else(|| ss.find_syntax_plain_text());
    let html = syntect::html::highlighted_html_for_string(code, &ss, syntax, theme)?;

    Ok(html)
}

pub fn commit_to_object(commit: &CommitInfo) -> Object {
    liquid::object!({
        "hash": commit.hash,
        "short_hash": commit.short_hash,
        "summary": commit.summary,
        "message": commit.message,
        "author": {
            "name": commit.author.name,
            "email": commit.author.email,
            "date": commit.author_date.format("%Y-%m-%d %H:%M:%S %z").to_string(),
        },
        "committer": {
            "name": commit.committer.name,
            "email": commit.committer.email,
            "date": commit.committer_date.format("%Y-%m-%d %H:%M:%S %z").to_string(),
        },
        "parents": commit.parents,
    })
}

pub fn categorized_to_array(categorized: &CategorizedCommits<CommitInfo>) -> Vec<Object> {
    categorized
        .buckets()
        .iter()
        .map(|bucket| {
            let commits: Vec<Object> = bucket.commits.iter().map(commit_to_object).collect();
            liquid::object!({
                "date": bucket.date,
                "commits": commits,
            })
        })
        .collect()
}

pub fn blame_to_array(hunks: &[BlameHunk]) -> Vec<Object> {
    hunks
        .iter()
        .map(|hunk| {
            let numbers: Vec<usize> = (hunk.start_line..hunk.start_line + hunk.lines.len()).collect();
            let escaped: Vec<String> = hunk
                .lines
                .iter()
                .map(|line| html_escape::encode_text(line).into_owned())
                .collect();
            liquid::object!({
                "commit": commit_to_object(&hunk.commit),
                "start_line": hunk.start_line,
                "line_numbers": numbers,
                "lines": escaped.join("\n"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateField;
    use crate::testing::Fixture;

    #[test]
    fn all_templates_parse() {
        let templates = Templates::load().unwrap();
        for (name, _) in SOURCES {
            assert!(templates.templates.contains_key(name));
        }
        assert!(matches!(templates.render("nope", &Object::new()), Err(ShelfError::NotFound)));
    }

    #[test]
    fn buckets_and_blame_objects() {
        let fx = Fixture::new("myrepo");
        fx.commit("main", &[("a.html", "<b>\n")], "first", "2024-01-09T10:00:00+00:00");
        let repo = fx.open();

        let commits = repo.log(&crate::git::LogSpec::new("main", None)).unwrap().page(0, 15).unwrap();
        let array = categorized_to_array(&CategorizedCommits::by_date(commits, DateField::Committer));
        assert_eq!(array.len(), 1);

        let hunks = repo.blame(&crate::git::LogSpec::new("main", Some("a.html"))).unwrap();
        let array = blame_to_array(&hunks);
        assert_eq!(array.len(), 1);
        let rendered = liquid::ParserBuilder::with_stdlib()
            .build()
            .unwrap()
            .parse("{{ hunk.lines }}|{{ hunk.line_numbers | join: ',' }}")
            .unwrap()
            .render(&liquid::object!({ "hunk": array[0] }))
            .unwrap();
        assert_eq!(rendered, "&lt;b&gt;|1");
    }
}
