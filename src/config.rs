//! Loads the project configuration. A project is described by a
//! `marksmith.yaml` file; every key is optional and falls back to the values
//! in [`Config::default`], so a directory with only `posts/` and `templates/`
//! builds without any configuration at all.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "marksmith.yaml";

/// The order in which posts are sorted by date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest post first.
    Asc,

    /// Newest post first.
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    // Anything but `desc` sorts ascending.
    fn deserialize<D>(deserializer: D) -> std::result::Result<SortOrder, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        })
    }
}

/// Controls which files [`crate::discover::find_sources`] picks up.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoverySettings {
    /// The extension (without the leading `.`) of source files.
    pub extension: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        DiscoverySettings {
            extension: String::from("md"),
        }
    }
}

/// Controls how rendered pages are written to disk.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WriteSettings {
    /// Create missing parent directories of the target file.
    pub create_directories: bool,

    /// Replace files which already exist. When unset, writing over an
    /// existing file is an error.
    pub overwrite: bool,
}

impl Default for WriteSettings {
    fn default() -> Self {
        WriteSettings {
            create_directories: true,
            overwrite: true,
        }
    }
}

/// Settings handed to the template engine when a template is compiled.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateSettings {
    /// Partial template files (e.g., `{{define "header"}}` blocks) which are
    /// parsed together with every page template.
    pub includes: Vec<PathBuf>,
}

/// The fully resolved configuration for one run. All paths are usable as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub output_directory: PathBuf,
    pub source_directory: PathBuf,
    pub discovery: DiscoverySettings,
    pub sort_order: SortOrder,
    pub index_template: PathBuf,
    pub index_output: PathBuf,
    pub write: WriteSettings,
    pub post_template: PathBuf,
    pub post_output_directory: PathBuf,
    pub templates: TemplateSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_root(Path::new(""))
    }
}

// The on-disk shape of `marksmith.yaml`.
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Project {
    output_directory: Option<PathBuf>,
    source_directory: Option<PathBuf>,
    discovery: Option<DiscoverySettings>,
    sort_order: Option<SortOrder>,
    index_template: Option<PathBuf>,
    index_output: Option<PathBuf>,
    write: Option<WriteSettings>,
    post_template: Option<PathBuf>,
    post_output_directory: Option<PathBuf>,
    templates: Option<TemplateSettings>,
}

impl Config {
    // The default layout, rooted at `root`.
    fn with_root(root: &Path) -> Config {
        let output_directory = root.join("www");
        Config {
            index_output: output_directory.join("index.html"),
            post_output_directory: output_directory.clone(),
            output_directory,
            source_directory: root.join("posts"),
            discovery: DiscoverySettings::default(),
            sort_order: SortOrder::default(),
            index_template: root.join("templates").join("index.html"),
            write: WriteSettings::default(),
            post_template: root.join("templates").join("post.html"),
            templates: TemplateSettings::default(),
        }
    }

    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found. Falls back to [`Config::default`] (rooted at `dir`)
    /// when there is no project file anywhere up the tree.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(d) = current {
            let path = d.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path)
                    .with_context(|| format!("Loading configuration `{}`", path.display()));
            }
            current = d.parent();
        }
        Ok(Config::with_root(dir))
    }

    /// Loads a project file. Relative paths inside it are resolved against
    /// the directory containing the file.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let contents = crate::fsio::read_file(path)?;
        let root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Config::from_yaml(root, &contents)
    }

    /// Parses project-file contents with relative paths resolved against
    /// `root`.
    pub fn from_yaml(root: &Path, input: &str) -> Result<Config> {
        let project: Project = if input.trim().is_empty() {
            Project::default()
        } else {
            serde_yaml::from_str(input)?
        };

        let mut config = Config::with_root(root);
        if let Some(dir) = project.output_directory {
            config.set_output_directory(&root.join(dir));
        }
        if let Some(dir) = project.source_directory {
            config.source_directory = root.join(dir);
        }
        if let Some(discovery) = project.discovery {
            config.discovery = discovery;
        }
        if let Some(order) = project.sort_order {
            config.sort_order = order;
        }
        if let Some(template) = project.index_template {
            config.index_template = root.join(template);
        }
        if let Some(output) = project.index_output {
            config.index_output = root.join(output);
        }
        if let Some(write) = project.write {
            config.write = write;
        }
        if let Some(template) = project.post_template {
            config.post_template = root.join(template);
        }
        if let Some(dir) = project.post_output_directory {
            config.post_output_directory = root.join(dir);
        }
        if let Some(mut templates) = project.templates {
            templates.includes = templates
                .includes
                .iter()
                .map(|include| root.join(include))
                .collect();
            config.templates = templates;
        }
        Ok(config)
    }

    /// Moves the output directory. The post output directory and the index
    /// file move with it; the index file keeps its file name.
    pub fn set_output_directory(&mut self, dir: &Path) {
        let index_name = self
            .index_output
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("index.html"));
        self.index_output = dir.join(index_name);
        self.post_output_directory = dir.to_owned();
        self.output_directory = dir.to_owned();
    }
}
