//! The library code for the `marksmith` static site generator. It turns a
//! directory of markdown posts with YAML frontmatter into an index page and
//! one page per post.
//!
//! The work is done by a [`pipeline::Pipeline`], which runs the following
//! steps over an in-memory collection of posts:
//!
//! 1. Listing and reading source files ([`crate::discover`], [`crate::fsio`])
//! 2. Splitting each file into metadata and a markdown body ([`crate::post`])
//! 3. Sorting the posts by date
//! 4. Converting the bodies to HTML ([`crate::markdown`])
//! 5. Rendering the index and post pages through templates
//!    ([`crate::template`], [`crate::value`])
//!
//! A broken post never stops the build. Each step logs what went wrong and
//! moves on; the outcome of every page is tallied and summarized at the end
//! ([`crate::stats`]).
//!
//! Collaborators which do the per-file work sit behind traits
//! ([`post::Extractor`], [`markdown::MarkdownRenderer`],
//! [`template::TemplateEngine`]) so they can be swapped out.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod discover;
pub mod fsio;
pub mod markdown;
pub mod pipeline;
pub mod post;
pub mod stats;
pub mod template;
pub mod value;
