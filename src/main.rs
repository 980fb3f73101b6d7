use anyhow::{Context, Result};
use clap::{App, Arg};
use marksmith::config::Config;
use marksmith::pipeline::build_site;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("marksmith")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Renders a directory of markdown posts into a static site")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .help("The project file (default: the nearest marksmith.yaml)"),
        )
        .arg(
            Arg::with_name("source")
                .short("s")
                .long("source")
                .value_name("DIR")
                .takes_value(true)
                .help("The directory containing the markdown posts"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("DIR")
                .takes_value(true)
                .help("The directory in which the pages are written"),
        )
        .arg(
            Arg::with_name("no-clean")
                .long("no-clean")
                .help("Keep previously generated pages in the output directory"),
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("Exit with an error if any page failed to build"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => Config::from_project_file(Path::new(path))
            .with_context(|| format!("Loading configuration `{}`", path))?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };
    if let Some(dir) = matches.value_of("source") {
        config.source_directory = PathBuf::from(dir);
    }
    if let Some(dir) = matches.value_of("output") {
        config.set_output_directory(Path::new(dir));
    }

    let stats = build_site(&config, !matches.is_present("no-clean"));
    if matches.is_present("strict") && stats.has_failures() {
        anyhow::bail!("{} pages failed to build", stats.total_failed());
    }
    Ok(())
}
