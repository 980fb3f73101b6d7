//! The build pipeline. A [`Pipeline`] owns the posts of one run and moves
//! them through a fixed sequence of stages:
//!
//! 1. [`Pipeline::discover`] lists the source files
//! 2. [`Pipeline::populate`] reads them
//! 3. [`Pipeline::extract_metadata`] splits frontmatter from markdown
//! 4. [`Pipeline::sort`] orders the posts by date
//! 5. [`Pipeline::convert_to_html`] renders the markdown bodies
//! 6. [`Pipeline::render_index`] writes the index page
//! 7. [`Pipeline::render_posts`] writes one page per post
//!
//! No stage fails. A file that can't be processed is logged and either
//! dropped or recorded as a failed page in the [`StatusTally`], and the stage
//! carries on with the next one. [`Pipeline::stats`] summarizes the outcome.
//!
//! Each stage appends to the collections of the stages before it, so running
//! a stage twice accumulates results instead of replacing them. Stages which
//! take an `Option` argument fall back to the previous stage's output or to
//! the [`Config`] when it is `None` (or empty).

use crate::config::{Config, DiscoverySettings, SortOrder, WriteSettings};
use crate::discover;
use crate::fsio;
use crate::markdown::{CmarkRenderer, MarkdownRenderer};
use crate::post::{Extractor, FrontmatterExtractor, PostRecord, SourceFile};
use crate::stats::{Stats, StatusTally};
use crate::template::{self, GtmplEngine, Render, TemplateEngine};
use crate::value;
use gtmpl::Value;
use log::{debug, error, info};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// Orchestrates a site build. See the module documentation.
pub struct Pipeline<'a> {
    config: &'a Config,
    extractor: Box<dyn Extractor>,
    markdown: Box<dyn MarkdownRenderer>,
    templates: Box<dyn TemplateEngine>,

    files: Vec<PathBuf>,
    sources: Vec<SourceFile>,
    posts: Vec<PostRecord>,
    tally: StatusTally,
    index_attempts: usize,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline with the YAML frontmatter extractor, the
    /// pulldown-cmark renderer and the gtmpl template engine.
    pub fn new(config: &'a Config) -> Pipeline<'a> {
        Pipeline {
            config,
            extractor: Box::new(FrontmatterExtractor),
            markdown: Box::new(CmarkRenderer),
            templates: Box::new(GtmplEngine),
            files: Vec::new(),
            sources: Vec::new(),
            posts: Vec::new(),
            tally: StatusTally::default(),
            index_attempts: 0,
        }
    }

    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_markdown(mut self, markdown: impl MarkdownRenderer + 'static) -> Self {
        self.markdown = Box::new(markdown);
        self
    }

    pub fn with_templates(mut self, templates: impl TemplateEngine + 'static) -> Self {
        self.templates = Box::new(templates);
        self
    }

    /// The most recent discovery result.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn tally(&self) -> &StatusTally {
        &self.tally
    }

    /// The number of [`Pipeline::render_index`] calls so far.
    pub fn index_attempts(&self) -> usize {
        self.index_attempts
    }

    /// Deletes the generated `*.html` files in `path` (default: the output
    /// directory). Cleanup is best-effort: failures are logged and this
    /// always returns `true`.
    pub fn clean_outputs(&self, path: Option<&Path>) -> bool {
        let dir = or_default(path, &self.config.output_directory);
        match discover::clean_html(dir) {
            Ok(removed) => debug!("Removed {} files from '{}'", removed, dir.display()),
            Err(e) => error!("{}", e),
        }
        true
    }

    /// Lists the source files in `path` (default: the source directory)
    /// matching `settings` (default: the configured discovery settings).
    /// When the directory can't be listed the error is logged and the
    /// previous result is kept.
    pub fn discover(
        &mut self,
        path: Option<&Path>,
        settings: Option<&DiscoverySettings>,
    ) -> &[PathBuf] {
        let config = self.config;
        let dir = or_default(path, &config.source_directory);
        match discover::find_sources(dir, settings.unwrap_or(&config.discovery)) {
            Ok(files) => {
                debug!("Found {} source files in '{}'", files.len(), dir.display());
                self.files = files;
            }
            Err(e) => error!("{}", e),
        }
        &self.files
    }

    /// Reads each of `paths` (default: the discovered files). Files which
    /// can't be read or are empty are logged and left out.
    pub fn populate(&mut self, paths: Option<&[PathBuf]>) -> &[SourceFile] {
        let paths: &[PathBuf] = match paths {
            Some(paths) if !paths.is_empty() => paths,
            _ => &self.files,
        };

        for path in paths {
            match fsio::read_file(path) {
                Ok(content) if content.is_empty() => {
                    error!("A file {} is empty", path.display())
                }
                Ok(content) => self.sources.push(SourceFile {
                    path: path.clone(),
                    content,
                }),
                Err(e) => error!("{}", e),
            }
        }
        &self.sources
    }

    /// Extracts the metadata of each of `sources` (default: the populated
    /// files). A file without usable metadata is dropped and counted as a
    /// failed post.
    pub fn extract_metadata(&mut self, sources: Option<&[SourceFile]>) -> &[PostRecord] {
        let sources: &[SourceFile] = match sources {
            Some(sources) if !sources.is_empty() => sources,
            _ => &self.sources,
        };

        for source in sources {
            match self.extractor.extract(&source.content, &source.path) {
                Ok(Some(extracted)) => self.posts.push(PostRecord {
                    path: source.path.clone(),
                    info: extracted.info,
                    post: extracted.body,
                    file: None,
                }),
                Ok(None) => {
                    error!("No metadata found in {}", source.path.display());
                    self.tally.posts.push(false);
                }
                Err(e) => {
                    error!("{}", e);
                    self.tally.posts.push(false);
                }
            }
        }
        &self.posts
    }

    /// Sorts `records` (default: the extracted posts) in place by date in
    /// the configured order. See [`sort_posts`] for what happens when a post
    /// has no date.
    pub fn sort(&mut self, records: Option<&mut [PostRecord]>) {
        let order = self.config.sort_order;
        let records = match records {
            Some(records) => records,
            None => &mut self.posts[..],
        };
        if let Err(e) = sort_posts(records, order) {
            error!("Failed to sort elements: {}", e);
        }
    }

    /// Renders the markdown body of every post. A post whose body fails to
    /// render is kept without HTML.
    pub fn convert_to_html(&mut self) -> &[PostRecord] {
        for record in self.posts.iter_mut() {
            record.file = match self.markdown.render(&record.post) {
                Ok(html) => Some(html),
                Err(e) => {
                    error!("Failed to parse html from {}: {}", record.path.display(), e);
                    None
                }
            };
        }
        &self.posts
    }

    /// Renders all posts through `template` (default: the configured index
    /// template) and writes the result to `output` (default: the configured
    /// index output). Every call counts as an attempt, whether or not the
    /// page is written.
    pub fn render_index(
        &mut self,
        template: Option<&Path>,
        output: Option<&Path>,
        settings: Option<&WriteSettings>,
    ) {
        self.index_attempts += 1;

        let config = self.config;
        let template = or_default(template, &config.index_template);
        let output = or_default(output, &config.index_output);
        let settings = settings.unwrap_or(&config.write);

        let render = match self.templates.compile(template, &config.templates) {
            Ok(render) => render,
            Err(e) => {
                error!("Failed to create render function for index page: {}", e);
                self.tally.index.push(false);
                return;
            }
        };

        match write_page(&*render, &value::index_payload(&self.posts), output, settings) {
            Ok(()) => {
                info!("Index page {} is written", output.display());
                self.tally.index.push(true);
            }
            Err(e) => {
                error!("Failed to write index page: {}", e);
                self.tally.index.push(false);
            }
        }
    }

    /// Renders every post through `template` (default: the configured post
    /// template) into `post-{postId}.html` files in `output_directory`
    /// (default: the configured post output directory). Each post records
    /// one outcome. If the template can't be compiled, nothing is written
    /// and every post is recorded as failed.
    pub fn render_posts(
        &mut self,
        template: Option<&Path>,
        output_directory: Option<&Path>,
        settings: Option<&WriteSettings>,
    ) {
        let config = self.config;
        let template = or_default(template, &config.post_template);
        let output_directory = or_default(output_directory, &config.post_output_directory);
        let settings = settings.unwrap_or(&config.write);

        let render = match self.templates.compile(template, &config.templates) {
            Ok(render) => render,
            Err(e) => {
                error!("Failed to create render function for post page: {}", e);
                for record in &self.posts {
                    error!(
                        "Skipping postId: {}, file: {}",
                        record.info.post_id,
                        record.file_name()
                    );
                    self.tally.posts.push(false);
                }
                return;
            }
        };

        for record in &self.posts {
            let file_name = record.file_name();
            let path = output_directory.join(&file_name);
            match write_page(&*render, &value::post_payload(record), &path, settings) {
                Ok(()) => {
                    info!(
                        "A file {} and postId {} is written to html",
                        file_name, record.info.post_id
                    );
                    self.tally.posts.push(true);
                }
                Err(e) => {
                    error!(
                        "{} (postId: {}, file: {})",
                        e, record.info.post_id, file_name
                    );
                    self.tally.posts.push(false);
                }
            }
        }
    }

    /// Summarizes the outcomes recorded so far.
    pub fn stats(&self) -> Stats {
        Stats::new(&self.tally, self.index_attempts, self.files.len())
    }

    /// Logs the [`Pipeline::stats`] summary and returns it.
    pub fn report_stats(&self) -> Stats {
        let stats = self.stats();
        for line in stats.to_string().lines() {
            info!("{}", line);
        }
        stats
    }
}

/// Builds the site described by `config`: optionally cleans the output
/// directory, then runs every stage with its defaults and reports the
/// statistics.
pub fn build_site(config: &Config, clean: bool) -> Stats {
    let mut pipeline = Pipeline::new(config);
    if clean {
        pipeline.clean_outputs(None);
    }
    pipeline.discover(None, None);
    pipeline.populate(None);
    pipeline.extract_metadata(None);
    pipeline.sort(None);
    pipeline.convert_to_html();
    pipeline.render_index(None, None, None);
    pipeline.render_posts(None, None, None);
    pipeline.report_stats()
}

// An empty path means "not given".
fn or_default<'p>(path: Option<&'p Path>, default: &'p Path) -> &'p Path {
    match path {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => default,
    }
}

// Templates a single page and writes it to disk.
fn write_page(
    render: &dyn Render,
    payload: &Value,
    path: &Path,
    settings: &WriteSettings,
) -> Result<(), PageError> {
    let html = render.render(payload)?;
    fsio::write_file(path, &html, settings)?;
    Ok(())
}

/// Sorts posts by date using an in-place insertion sort (stable), newest
/// first for [`SortOrder::Desc`] and oldest first otherwise.
///
/// Dates are compared as millisecond timestamps. The first comparison
/// involving a post without a date aborts the sort and returns an error;
/// `records` is left in whatever order the sort had reached, which is in
/// general neither the original nor the sorted order.
pub fn sort_posts(records: &mut [PostRecord], order: SortOrder) -> Result<(), SortError> {
    for i in 1..records.len() {
        let mut j = i;
        while j > 0 {
            if compare(&records[j - 1], &records[j], order)? != Ordering::Greater {
                break;
            }
            records.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}

fn compare(a: &PostRecord, b: &PostRecord, order: SortOrder) -> Result<Ordering, SortError> {
    fn millis(record: &PostRecord) -> Result<i64, SortError> {
        record
            .info
            .date
            .map(|date| date.timestamp_millis())
            .ok_or_else(|| SortError::MissingDate(record.path.clone()))
    }

    let (a, b) = (millis(a)?, millis(b)?);
    Ok(match order {
        SortOrder::Desc => b.cmp(&a),
        SortOrder::Asc => a.cmp(&b),
    })
}

/// Returned by [`sort_posts`] when a post can't be compared.
#[derive(Debug)]
pub enum SortError {
    /// The post read from this path has no date.
    MissingDate(PathBuf),
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SortError::MissingDate(path) => {
                write!(f, "post `{}` has no date", path.display())
            }
        }
    }
}

impl std::error::Error for SortError {}

// Why a single page couldn't be produced.
#[derive(Debug)]
enum PageError {
    Template(template::Error),
    Write(fsio::Error),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageError::Template(err) => err.fmt(f),
            PageError::Write(err) => err.fmt(f),
        }
    }
}

impl From<template::Error> for PageError {
    fn from(err: template::Error) -> PageError {
        PageError::Template(err)
    }
}

impl From<fsio::Error> for PageError {
    fn from(err: fsio::Error) -> PageError {
        PageError::Write(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown;
    use crate::post::{self, Extracted, Metadata};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    const INDEX_TEMPLATE: &str =
        r#"<ul>{{range .values}}<li><a href="{{.href}}">{{.info.title}}</a></li>{{end}}</ul>"#;
    const POST_TEMPLATE: &str = r#"<h2>{{.values.info.title}}</h2>{{.values.html}}"#;

    // A project directory with the default layout.
    struct Fixture {
        dir: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Fixture {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("posts")).unwrap();
            fs::create_dir_all(dir.path().join("templates")).unwrap();
            fs::write(dir.path().join("templates/index.html"), INDEX_TEMPLATE).unwrap();
            fs::write(dir.path().join("templates/post.html"), POST_TEMPLATE).unwrap();
            let config = Config::from_yaml(dir.path(), "").unwrap();
            Fixture { dir, config }
        }

        fn with_sort_order(mut self, order: SortOrder) -> Fixture {
            self.config.sort_order = order;
            self
        }

        fn post(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join("posts").join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn output(&self, name: &str) -> PathBuf {
            self.dir.path().join("www").join(name)
        }
    }

    fn source(id: &str, date: &str, title: &str) -> String {
        format!(
            "---\npostId: {}\ndate: {}\ntitle: {}\nauthor: Jane\n---\n# {}\n",
            id, date, title, title
        )
    }

    fn record(id: &str, date: Option<(i32, u32, u32)>) -> PostRecord {
        PostRecord {
            path: PathBuf::from(format!("posts/{}.md", id)),
            info: Metadata {
                post_id: id.to_owned(),
                date: date.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
                title: id.to_owned(),
                author: String::new(),
                description: String::new(),
                image: String::new(),
            },
            post: format!("# {}", id),
            file: None,
        }
    }

    fn ids(records: &[PostRecord]) -> Vec<&str> {
        records.iter().map(|r| r.info.post_id.as_str()).collect()
    }

    struct FailingMarkdown;

    impl MarkdownRenderer for FailingMarkdown {
        fn render(&self, _: &str) -> Result<String, markdown::Error> {
            Err(markdown::Error(String::from("renderer unavailable")))
        }
    }

    struct FailingExtractor;

    impl Extractor for FailingExtractor {
        fn extract(&self, _: &str, path: &Path) -> post::Result<Option<Extracted>> {
            Err(post::Error::InvalidFileName(path.to_owned()))
        }
    }

    #[test]
    fn test_full_pipeline() {
        let fixture = Fixture::new();
        fixture.post("hello.md", &source("20", "2021-04-16", "Hello"));

        let mut pipeline = Pipeline::new(&fixture.config);
        assert_eq!(1, pipeline.discover(None, None).len());
        assert_eq!(1, pipeline.populate(None).len());
        assert_eq!(1, pipeline.extract_metadata(None).len());
        pipeline.sort(None);
        pipeline.convert_to_html();
        pipeline.render_index(None, None, None);
        pipeline.render_posts(None, None, None);

        assert_eq!(vec![true], pipeline.tally().posts);
        assert_eq!(vec![true], pipeline.tally().index);

        let page = fs::read_to_string(fixture.output("post-20.html")).unwrap();
        assert_eq!("<h2>Hello</h2><h1>Hello</h1>\n", page);

        let index = fs::read_to_string(fixture.output("index.html")).unwrap();
        assert_eq!(
            r#"<ul><li><a href="post-20.html">Hello</a></li></ul>"#,
            index
        );

        let stats = pipeline.stats();
        assert_eq!(1, stats.discovered);
        assert_eq!(1, stats.posts_succeeded);
        assert_eq!(1, stats.index_succeeded);
        assert!(!stats.has_failures());
    }

    #[test]
    fn test_build_site() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2020-01-01", "First"));
        fixture.post("b.md", &source("2", "2021-01-01", "Second"));
        fs::create_dir_all(fixture.output("")).unwrap();
        fs::write(fixture.output("post-stale.html"), "old").unwrap();

        let stats = build_site(&fixture.config, true);
        assert_eq!(2, stats.posts_succeeded);
        assert_eq!(1, stats.index_succeeded);
        assert!(!fixture.output("post-stale.html").exists());
        assert!(fixture.output("post-1.html").exists());
        assert!(fixture.output("post-2.html").exists());

        // Newest first by default.
        let index = fs::read_to_string(fixture.output("index.html")).unwrap();
        assert!(index.find("Second").unwrap() < index.find("First").unwrap());
    }

    #[test]
    fn test_build_site_rejects_escaping_post_id() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2020-01-01", "First"));
        fixture.post("evil.md", &source("x/../../escaped", "2021-01-01", "Evil"));

        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        assert_eq!(vec!["1"], ids(pipeline.posts()));
        assert_eq!(vec![false], pipeline.tally().posts);

        let stats = build_site(&fixture.config, true);
        assert_eq!(1, stats.posts_succeeded);
        assert_eq!(1, stats.posts_failed);
        assert!(!fixture.dir.path().join("escaped.html").exists());
        assert!(!fixture.output("post-x").exists());
        assert!(fixture.output("post-1.html").exists());
    }

    #[test]
    fn test_populate_drops_empty_files() {
        let fixture = Fixture::new();
        let good = fixture.post("good.md", &source("1", "2021-01-01", "Good"));
        let empty = fixture.post("empty.md", "");

        let mut pipeline = Pipeline::new(&fixture.config);
        let sources = pipeline.populate(Some(&[empty, good.clone()][..]));
        assert_eq!(1, sources.len());
        assert_eq!(good, sources[0].path);
        assert_eq!(source("1", "2021-01-01", "Good"), sources[0].content);
        assert!(pipeline.tally().posts.is_empty());
    }

    #[test]
    fn test_populate_drops_unreadable_files() {
        let fixture = Fixture::new();
        let good = fixture.post("good.md", &source("1", "2021-01-01", "Good"));
        let missing = fixture.dir.path().join("posts").join("missing.md");

        let mut pipeline = Pipeline::new(&fixture.config);
        assert_eq!(1, pipeline.populate(Some(&[missing, good][..])).len());
    }

    #[test]
    fn test_extract_metadata_counts_dropped_files() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));
        fixture.post("b.md", "# No frontmatter\n");
        fixture.post("c.md", "---\ntitle: [broken\n---\nbody\n");

        let mut pipeline = Pipeline::new(&fixture.config);
        let discovered = pipeline.discover(None, None).len();
        pipeline.populate(None);
        let posts = pipeline.extract_metadata(None).len();

        assert_eq!(3, discovered);
        assert_eq!(1, posts);
        assert_eq!(vec![false, false], pipeline.tally().posts);
    }

    #[test]
    fn test_extractor_error_is_counted() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));

        let mut pipeline = Pipeline::new(&fixture.config).with_extractor(FailingExtractor);
        pipeline.discover(None, None);
        pipeline.populate(None);
        assert!(pipeline.extract_metadata(None).is_empty());
        assert_eq!(vec![false], pipeline.tally().posts);
    }

    #[test]
    fn test_stages_accumulate() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));

        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.discover(None, None);
        pipeline.populate(None);
        assert_eq!(2, pipeline.populate(None).len());
        pipeline.extract_metadata(None);
        assert_eq!(4, pipeline.extract_metadata(None).len());
    }

    #[test]
    fn test_discover_failure_keeps_previous_result() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));

        let mut pipeline = Pipeline::new(&fixture.config);
        assert_eq!(1, pipeline.discover(None, None).len());
        let missing = fixture.dir.path().join("missing");
        assert_eq!(1, pipeline.discover(Some(missing.as_path()), None).len());
        assert_eq!(1, pipeline.discover(Some(Path::new("")), None).len());
    }

    #[test]
    fn test_discover_with_settings() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));
        fixture.post("b.markdown", &source("2", "2021-01-01", "Other"));

        let settings = DiscoverySettings {
            extension: String::from("markdown"),
        };
        let mut pipeline = Pipeline::new(&fixture.config);
        let files = pipeline.discover(None, Some(&settings));
        assert_eq!(1, files.len());
        assert!(files[0].ends_with("b.markdown"));
    }

    #[test]
    fn test_sort_descending() {
        let fixture = Fixture::new().with_sort_order(SortOrder::Desc);
        let mut records = vec![
            record("2020", Some((2020, 1, 1))),
            record("2022", Some((2022, 1, 1))),
            record("2021", Some((2021, 1, 1))),
        ];
        Pipeline::new(&fixture.config).sort(Some(&mut records[..]));
        assert_eq!(vec!["2022", "2021", "2020"], ids(&records));
    }

    #[test]
    fn test_sort_ascending() {
        let fixture = Fixture::new().with_sort_order(SortOrder::Asc);
        let mut records = vec![
            record("2020", Some((2020, 1, 1))),
            record("2022", Some((2022, 1, 1))),
            record("2021", Some((2021, 1, 1))),
        ];
        Pipeline::new(&fixture.config).sort(Some(&mut records[..]));
        assert_eq!(vec!["2020", "2021", "2022"], ids(&records));
    }

    #[test]
    fn test_sort_defaults_to_extracted_posts() {
        let fixture = Fixture::new().with_sort_order(SortOrder::Asc);
        fixture.post("a.md", &source("new", "2022-01-01", "New"));
        fixture.post("b.md", &source("old", "2020-01-01", "Old"));

        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        pipeline.sort(None);
        assert_eq!(vec!["old", "new"], ids(pipeline.posts()));
    }

    #[test]
    fn test_sort_is_stable() -> Result<(), SortError> {
        let mut records = vec![
            record("b", Some((2021, 1, 1))),
            record("a", Some((2021, 1, 1))),
            record("c", Some((2020, 1, 1))),
        ];
        sort_posts(&mut records, SortOrder::Desc)?;
        assert_eq!(vec!["b", "a", "c"], ids(&records));
        Ok(())
    }

    #[test]
    fn test_sort_failure_keeps_partial_order() {
        let mut records = vec![
            record("2022", Some((2022, 1, 1))),
            record("2021", Some((2021, 1, 1))),
            record("undated", None),
            record("2020", Some((2020, 1, 1))),
        ];
        let result = sort_posts(&mut records, SortOrder::Asc);
        assert!(matches!(result, Err(SortError::MissingDate(_))));
        assert_eq!(vec!["2021", "2022", "undated", "2020"], ids(&records));
    }

    #[test]
    fn test_convert_to_html_is_idempotent() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));

        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        let first = pipeline.convert_to_html()[0].file.clone();
        let second = pipeline.convert_to_html()[0].file.clone();
        assert_eq!(Some(String::from("<h1>Good</h1>\n")), first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_convert_failure_renders_empty_body() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "Good"));

        let mut pipeline = Pipeline::new(&fixture.config).with_markdown(FailingMarkdown);
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        assert_eq!(None, pipeline.convert_to_html()[0].file);

        pipeline.render_posts(None, None, None);
        assert_eq!(vec![true], pipeline.tally().posts);
        let page = fs::read_to_string(fixture.output("post-1.html")).unwrap();
        assert!(page.starts_with("<h2>Good</h2>"));
        assert!(!page.contains("<h1>"));
    }

    #[test]
    fn test_render_index_counts_every_attempt() {
        let fixture = Fixture::new();
        let mut pipeline = Pipeline::new(&fixture.config);

        let missing = fixture.dir.path().join("templates/missing.html");
        pipeline.render_index(Some(missing.as_path()), None, None);
        assert_eq!(1, pipeline.index_attempts());
        assert_eq!(vec![false], pipeline.tally().index);
        assert!(!fixture.output("index.html").exists());

        pipeline.render_index(None, None, None);
        assert_eq!(2, pipeline.index_attempts());
        assert_eq!(vec![false, true], pipeline.tally().index);

        let stats = pipeline.stats();
        assert_eq!(2, stats.index_attempts);
        assert_eq!(1, stats.index_succeeded);
        assert_eq!(1, stats.index_failed);
    }

    #[test]
    fn test_render_index_to_custom_output() {
        let fixture = Fixture::new();
        let output = fixture.dir.path().join("public").join("home.html");
        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.render_index(None, Some(output.as_path()), None);
        assert_eq!("<ul></ul>", fs::read_to_string(&output).unwrap());
    }

    #[test]
    fn test_render_posts_template_failure_fails_every_post() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "A"));
        fixture.post("b.md", &source("2", "2021-01-02", "B"));

        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        let missing = fixture.dir.path().join("templates/missing.html");
        pipeline.render_posts(Some(missing.as_path()), None, None);

        assert_eq!(vec![false, false], pipeline.tally().posts);
        assert!(!fixture.output("post-1.html").exists());
        assert!(!fixture.output("post-2.html").exists());
    }

    #[test]
    fn test_render_posts_write_failure_is_local() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "A"));
        fixture.post("b.md", &source("2", "2021-01-02", "B"));
        fs::create_dir_all(fixture.output("")).unwrap();
        fs::write(fixture.output("post-1.html"), "keep").unwrap();

        let settings = WriteSettings {
            create_directories: true,
            overwrite: false,
        };
        let mut pipeline = Pipeline::new(&fixture.config);
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        pipeline.render_posts(None, None, Some(&settings));

        assert_eq!(vec![false, true], pipeline.tally().posts);
        assert_eq!("keep", fs::read_to_string(fixture.output("post-1.html")).unwrap());
        assert!(fixture.output("post-2.html").exists());
    }

    #[test]
    fn test_render_posts_execute_failure() {
        let fixture = Fixture::new();
        fixture.post("a.md", &source("1", "2021-01-01", "A"));

        let mut pipeline = Pipeline::new(&fixture.config).with_templates(
            |_: &Path, _: &crate::config::TemplateSettings| -> template::Result<Box<dyn Render>> {
                Ok(Box::new(|_: &Value| -> template::Result<String> {
                    Err(template::Error::Execute(String::from("no such field")))
                }))
            },
        );
        pipeline.discover(None, None);
        pipeline.populate(None);
        pipeline.extract_metadata(None);
        pipeline.render_posts(None, None, None);
        pipeline.render_index(None, None, None);

        assert_eq!(vec![false], pipeline.tally().posts);
        assert_eq!(vec![false], pipeline.tally().index);
        assert!(pipeline.stats().has_failures());
    }

    #[test]
    fn test_clean_outputs() {
        let fixture = Fixture::new();
        let out = fixture.output("");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("index.html"), "x").unwrap();
        fs::write(out.join("post-1.html"), "x").unwrap();

        let pipeline = Pipeline::new(&fixture.config);
        assert!(pipeline.clean_outputs(Some(out.as_path())));
        assert_eq!(0, fs::read_dir(&out).unwrap().count());
    }

    #[test]
    fn test_clean_outputs_is_best_effort() {
        let fixture = Fixture::new();
        let pipeline = Pipeline::new(&fixture.config);
        assert!(pipeline.clean_outputs(None));
        assert!(pipeline.clean_outputs(Some(fixture.dir.path().join("missing").as_path())));
    }
}
