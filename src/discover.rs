//! Lists source files and removes previously generated pages. Both only look
//! at the immediate children of a directory.

use crate::config::DiscoverySettings;
use log::warn;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The extension of generated pages removed by [`clean_html`].
const HTML_EXTENSION: &str = "html";

/// Returns the files directly inside `dir` whose extension matches
/// `settings.extension`, sorted by file name. Entries which can't be read are
/// logged and skipped, so the result may be partial. Fails only when `dir`
/// itself can't be listed.
pub fn find_sources(dir: &Path, settings: &DiscoverySettings) -> Result<Vec<PathBuf>> {
    matching_files(dir, &settings.extension)
}

/// Deletes every `*.html` file directly inside `dir` and returns the number
/// of files removed. A missing directory is already clean. A file which
/// can't be deleted is logged and skipped.
pub fn clean_html(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    Ok(remove_files(matching_files(dir, HTML_EXTENSION)?))
}

fn remove_files(paths: Vec<PathBuf>) -> usize {
    let mut removed = 0;
    for path in paths {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => warn!("{}", Error::Remove { path, err }),
        }
    }
    removed
}

fn matching_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .peekable();

    // The root is read before the first entry is yielded, so an error with
    // depth 0 means the directory itself is unusable.
    if let Some(Err(err)) = walker.peek() {
        if err.depth() == 0 {
            return Err(Error::ReadDir {
                path: dir.to_owned(),
                err: walker.next().and_then(|r| r.err()),
            });
        }
    }

    let mut paths = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry.path().extension().map_or(false, |ext| ext == extension)
                {
                    paths.push(entry.into_path());
                }
            }
            Err(err) => warn!("Skipping unreadable entry in '{}': {}", dir.display(), err),
        }
    }
    Ok(paths)
}

/// The result of a discovery or cleanup operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error listing or cleaning a directory.
#[derive(Debug)]
pub enum Error {
    /// Returned when the directory itself can't be listed.
    ReadDir {
        path: PathBuf,
        err: Option<walkdir::Error>,
    },

    /// Describes a generated file which couldn't be deleted. Cleanup logs it
    /// and carries on.
    Remove { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadDir { path, err: Some(err) } => {
                write!(f, "Failed to read dir by path: {}. Error: {}", path.display(), err)
            }
            Error::ReadDir { path, err: None } => {
                write!(f, "Failed to read dir by path: {}", path.display())
            }
            Error::Remove { path, err } => {
                write!(f, "Failed to clean file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadDir { path: _, err } => err
                .as_ref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Remove { path: _, err } => Some(err),
        }
    }
}
