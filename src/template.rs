//! Compiles page templates. A [`TemplateEngine`] turns a template file into a
//! [`Render`] function which maps a [`Value`] to an HTML string. The default
//! engine, [`GtmplEngine`], uses Go-style templates.

use crate::config::TemplateSettings;
use crate::fsio;
use gtmpl::{Context, Template, Value};
use std::fmt;
use std::path::Path;

/// A compiled template.
pub trait Render {
    fn render(&self, value: &Value) -> Result<String>;
}

impl<F> Render for F
where
    F: Fn(&Value) -> Result<String>,
{
    fn render(&self, value: &Value) -> Result<String> {
        self(value)
    }
}

/// Builds [`Render`] functions from template files.
pub trait TemplateEngine {
    fn compile(&self, location: &Path, settings: &TemplateSettings) -> Result<Box<dyn Render>>;
}

impl<F> TemplateEngine for F
where
    F: Fn(&Path, &TemplateSettings) -> Result<Box<dyn Render>>,
{
    fn compile(&self, location: &Path, settings: &TemplateSettings) -> Result<Box<dyn Render>> {
        self(location, settings)
    }
}

/// Compiles templates with [`gtmpl`].
#[derive(Clone, Copy, Debug, Default)]
pub struct GtmplEngine;

impl TemplateEngine for GtmplEngine {
    fn compile(&self, location: &Path, settings: &TemplateSettings) -> Result<Box<dyn Render>> {
        Ok(Box::new(parse_template(
            settings
                .includes
                .iter()
                .map(|include| include.as_path())
                .chain(Some(location)),
        )?))
    }
}

/// Wraps a parsed [`Template`].
pub struct GtmplRender(Template);

impl Render for GtmplRender {
    fn render(&self, value: &Value) -> Result<String> {
        self.0
            .render(&Context::from(value.clone()))
            .map_err(|e| Error::Execute(e.to_string()))
    }
}

// Loads the template file contents, joins them in order, and parses the
// result into a single template.
fn parse_template<'a>(template_files: impl Iterator<Item = &'a Path>) -> Result<GtmplRender> {
    let mut contents = String::new();
    for template_file in template_files {
        if !contents.is_empty() {
            contents.push('\n');
        }
        contents.push_str(&fsio::read_file(template_file)?);
    }

    let mut template = Template::default();
    template
        .parse(contents)
        .map_err(|e| Error::Parse(e.to_string()))?;
    Ok(GtmplRender(template))
}

/// The result of compiling or executing a template.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error compiling or executing a template.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file can't be read.
    Open(fsio::Error),

    /// Returned for errors parsing template files.
    Parse(String),

    /// Returned for errors executing a template.
    Execute(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open(err) => err.fmt(f),
            Error::Parse(err) => write!(f, "Parsing template: {}", err),
            Error::Execute(err) => write!(f, "Executing template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open(err) => Some(err),
            Error::Parse(_) => None,
            Error::Execute(_) => None,
        }
    }
}

impl From<fsio::Error> for Error {
    /// Converts [`fsio::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: fsio::Error) -> Error {
        Error::Open(err)
    }
}
