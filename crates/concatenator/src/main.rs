use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use concatenator::{Concatenator, Config, UndefinedConstantPolicy};
use log::{LevelFilter, error, info};

#[derive(Parser, Debug)]
#[command(name = "concatenator", version, about = "Concatenate script sources into a single file")]
struct Cli {
    /// Source files to concatenate, in order (glob patterns allowed)
    #[arg(value_name = "SOURCES")]
    sources: Vec<PathBuf>,

    /// Add a directory to the load path (searched in the order given)
    #[arg(short = 'I', long = "load-path", value_name = "DIR")]
    load_path: Vec<PathBuf>,

    /// Write the bundle to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base directory for source files
    #[arg(long)]
    root: Option<PathBuf>,

    /// Configuration file (defaults to concatenator.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep ordinary and block comments in the output
    #[arg(long)]
    keep_comments: bool,

    /// Treat source and load path entries literally instead of as globs
    #[arg(long)]
    no_expand_paths: bool,

    /// Append a build summary comment
    #[arg(long)]
    write_infos: bool,

    /// Define a constant, overriding the constants file
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
    defines: Vec<(String, String)>,

    /// Extension appended to names without one
    #[arg(long)]
    extension: Option<String>,

    /// Leave placeholders of undefined constants untouched
    #[arg(long)]
    ignore_undefined: bool,

    /// Directory provided assets are installed into
    #[arg(long)]
    asset_root: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_define(s: &str) -> Result<(String, String)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {s}"))?;
    Ok((name.trim().to_owned(), value.to_owned()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let default_path = Path::new(Config::DEFAULT_NAME);
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None if default_path.is_file() => Config::load(default_path)?,
        None => Config::default(),
    };

    if !cli.sources.is_empty() {
        config.source_files.clone_from(&cli.sources);
    }
    // Directories given on the command line are relative to the working directory
    for dir in &cli.load_path {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("Invalid load path directory {}", dir.display()))?;
        config.load_path.push(dir);
    }
    if let Some(root) = &cli.root {
        config.root.clone_from(root);
    }
    if let Some(extension) = &cli.extension {
        config.extension = extension.trim_start_matches('.').to_owned();
    }
    if let Some(asset_root) = &cli.asset_root {
        config.set_asset_root(asset_root)?;
    }
    if !cli.defines.is_empty() {
        config
            .constants
            .get_or_insert_with(Default::default)
            .extend(cli.defines.iter().cloned());
    }
    config.strip_comments &= !cli.keep_comments;
    config.expand_paths &= !cli.no_expand_paths;
    config.write_infos |= cli.write_infos;
    if cli.ignore_undefined {
        config.undefined_constants = UndefinedConstantPolicy::Ignore;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    if config.source_files.is_empty() {
        return Err(anyhow!("No source files given"));
    }

    let concatenator = Concatenator::new(config);
    let bundle = concatenator
        .concatenate()
        .context("Failed to concatenate sources")?;
    concatenator.install_assets(&bundle)?;

    match &cli.output {
        Some(path) => {
            bundle.output.save_to(path)?;
            info!("Wrote {} ({} bytes)", path.display(), bundle.output.len());
        }
        None => bundle
            .output
            .write_to(&mut io::stdout().lock())
            .context("Failed to write to stdout")?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
