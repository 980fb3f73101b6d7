use pulldown_cmark::{html, Options, Parser};
use std::fmt;

/// Converts a markdown body into an HTML fragment.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, Error>;
}

/// Renders CommonMark with footnotes, smart punctuation, strikethrough,
/// tables and task lists enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> Result<String, Error> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(markdown, options));
        Ok(out)
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub struct Error(pub String);

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for Error {}
