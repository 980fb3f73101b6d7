//! Defines the [`SourceFile`], [`Metadata`] and [`PostRecord`] types, the
//! [`Extractor`] interface, and [`FrontmatterExtractor`], which splits a
//! source file into YAML frontmatter and a markdown body.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// The raw contents of a discovered source file.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// The metadata of a post.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    /// Identifies the post. Output pages are named `post-{post_id}.html`.
    pub post_id: String,

    /// The publication date. Posts without a date can't be sorted.
    pub date: Option<DateTime<Utc>>,

    pub title: String,
    pub author: String,
    pub description: String,
    pub image: String,
}

/// A post moving through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PostRecord {
    /// The source file the post was read from.
    pub path: PathBuf,

    pub info: Metadata,

    /// The markdown body (everything after the frontmatter).
    pub post: String,

    /// The HTML fragment rendered from `post`; `None` until conversion
    /// succeeds.
    pub file: Option<String>,
}

impl PostRecord {
    /// The file name of the post's output page.
    pub fn file_name(&self) -> String {
        format!("post-{}.html", self.info.post_id)
    }
}

/// The successful result of [`Extractor::extract`].
#[derive(Clone, Debug, PartialEq)]
pub struct Extracted {
    pub info: Metadata,
    pub body: String,
}

/// Splits raw source content into metadata and a markdown body.
pub trait Extractor {
    /// Returns `Ok(None)` when `content` carries no metadata at all and an
    /// error when the metadata is present but malformed.
    fn extract(&self, content: &str, path: &Path) -> Result<Option<Extracted>>;
}

/// Extracts YAML frontmatter fenced by `---` lines:
///
/// ```md
/// ---
/// postId: 20
/// date: 2021-04-16
/// title: Hello, world!
/// author: Jane
/// ---
/// # Hello
///
/// World
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FrontmatterExtractor;

impl Extractor for FrontmatterExtractor {
    fn extract(&self, content: &str, path: &Path) -> Result<Option<Extracted>> {
        match self.extract_inner(content, path) {
            Ok(extracted) => Ok(extracted),
            Err(e) => Err(Error::Annotated(
                format!("extracting metadata from `{}`", path.display()),
                Box::new(e),
            )),
        }
    }
}

impl FrontmatterExtractor {
    fn extract_inner(&self, content: &str, path: &Path) -> Result<Option<Extracted>> {
        // Both fences must be whole lines; `---` inside a value or a body
        // thematic break after the closing fence doesn't count.
        fn frontmatter_indices(input: &str) -> Result<Option<(usize, usize, usize)>> {
            const FENCE: &str = "---";
            fn is_fence(line: &str) -> bool {
                line.trim_end_matches(|c: char| c == '\r' || c == '\n') == FENCE
            }

            let mut lines = input.split_inclusive('\n');
            let yaml_start = match lines.next() {
                Some(first) if is_fence(first) => first.len(),
                _ => return Ok(None),
            };

            let mut offset = yaml_start;
            for line in lines {
                if is_fence(line) {
                    return Ok(Some((
                        yaml_start,          // yaml_start
                        offset,              // yaml_stop
                        offset + line.len(), // body_start
                    )));
                }
                offset += line.len();
            }
            Err(Error::FrontmatterMissingEndFence)
        }

        let (yaml_start, yaml_stop, body_start) = match frontmatter_indices(content)? {
            Some(indices) => indices,
            None => return Ok(None),
        };

        let yaml = &content[yaml_start..yaml_stop];
        if yaml.trim().is_empty() {
            return Ok(None);
        }
        let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;

        let post_id = match frontmatter.post_id {
            Some(id) => id,
            None => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_owned)
                .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?,
        };
        validate_post_id(&post_id)?;

        let date = match frontmatter.date {
            Some(date) => Some(parse_date(&date)?),
            None => None,
        };

        Ok(Some(Extracted {
            info: Metadata {
                post_id,
                date,
                title: frontmatter.title,
                author: frontmatter.author,
                description: frontmatter.description,
                image: frontmatter.image,
            },
            body: content[body_start..]
                .trim_start_matches(|c: char| c == '\r' || c == '\n')
                .to_owned(),
        }))
    }
}

// A postId names an output file and must stay inside the output directory.
fn validate_post_id(post_id: &str) -> Result<()> {
    if post_id.is_empty()
        || post_id.contains(|c: char| c == '/' || c == '\\')
        || post_id.contains("..")
    {
        return Err(Error::InvalidPostId(post_id.to_owned()));
    }
    Ok(())
}

/// Parses a frontmatter date. Accepts RFC 3339 timestamps, naive date-times
/// (`2021-04-16 10:30:00` or `2021-04-16T10:30:00`) and plain dates, the
/// latter two interpreted as UTC.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }
    for format in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&date));
        }
    }
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => match date.and_hms_opt(0, 0, 0) {
            Some(midnight) => Ok(Utc.from_utc_datetime(&midnight)),
            None => Err(Error::InvalidDate(input.to_owned())),
        },
        Err(_) => Err(Error::InvalidDate(input.to_owned())),
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(
        default,
        rename = "postId",
        alias = "id",
        deserialize_with = "deserialize_post_id"
    )]
    post_id: Option<String>,

    #[serde(default, alias = "Date")]
    date: Option<String>,

    #[serde(default, alias = "Title")]
    title: String,

    #[serde(default, alias = "Author")]
    author: String,

    #[serde(default, alias = "Description")]
    description: String,

    #[serde(default, alias = "Image")]
    image: String,
}

// Post IDs are often written as bare numbers (`postId: 20`).
fn deserialize_post_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "postId must be a string or a number, found {:?}",
            other
        ))),
    }
}

/// Represents the result of a metadata extraction.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error extracting metadata from a source file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the opening `---` fence was found but the closing one
    /// was missing.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the `date` field isn't a recognizable date.
    InvalidDate(String),

    /// Returned when no `postId` was given and the file name isn't valid
    /// UTF-8.
    InvalidFileName(PathBuf),

    /// Returned when the `postId` is empty or contains a path separator or
    /// `..`.
    InvalidPostId(String),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate(date) => write!(f, "invalid date: {:?}", date),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::InvalidPostId(id) => write!(f, "invalid postId: {:?}", id),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate(_) => None,
            Error::InvalidFileName(_) => None,
            Error::InvalidPostId(_) => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
