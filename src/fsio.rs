//! Reading source files and writing rendered pages.

use crate::config::WriteSettings;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Reads the file at `path` into a string.
pub fn read_file(path: &Path) -> Result<String> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
    Ok(contents)
}

/// Writes `content` to `path` according to `settings`.
pub fn write_file(path: &Path, content: &str, settings: &WriteSettings) -> Result<()> {
    let annotate = |err| Error::Write {
        path: path.to_owned(),
        err,
    };

    if settings.create_directories {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(annotate)?;
            }
        }
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if settings.overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options
        .open(path)
        .and_then(|mut file| file.write_all(content.as_bytes()))
        .map_err(annotate)
}

/// The result of a fallible file operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an I/O error annotated with the file it happened on.
#[derive(Debug)]
pub enum Error {
    /// Returned when a file can't be opened or read as UTF-8.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a file (or its parent directory) can't be written.
    Write { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "Reading file '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
        }
    }
}
