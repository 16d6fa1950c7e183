use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use promptdir_indexer::{IndexConfig, IndexerError, PromptFiles};
use promptdir_protocol::{serialize_json, ErrorEnvelope};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

mod command;

#[derive(Parser)]
#[command(name = "promptdir")]
#[command(about = "Index, read and edit a directory of markdown prompts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Prompt directory (defaults to ~/.promptdir/prompts)
    #[arg(long, global = true, env = "PROMPTDIR_ROOT")]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print JSON to stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every indexed prompt
    List,

    /// Print the raw document of a prompt
    Get(NameArgs),

    /// Show indexed metadata of a prompt
    Meta(NameArgs),

    /// Print a prompt body with `{{key}}` arguments filled in
    Render(RenderArgs),

    /// Create or overwrite a prompt
    Add(AddArgs),

    /// Delete a prompt
    Delete(NameArgs),

    /// Keep the index in sync with the directory until Ctrl-C
    Watch,
}

#[derive(Args)]
struct NameArgs {
    /// Prompt name (`code-review`, `team/review` or `team_review`)
    name: String,
}

#[derive(Args)]
struct RenderArgs {
    name: String,

    /// Argument as key=value (repeatable)
    #[arg(long = "arg", value_parser = parse_key_value)]
    args: Vec<(String, String)>,
}

#[derive(Args)]
struct AddArgs {
    name: String,

    /// Read the document body from this file instead of stdin
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Tag for the header (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn error_envelope(err: &anyhow::Error) -> ErrorEnvelope {
    match err.downcast_ref::<IndexerError>() {
        Some(IndexerError::NotFound { name }) => {
            ErrorEnvelope::new("not_found", format!("Prompt not found: {name}"))
                .with_hint("Run `promptdir list` to see available prompts")
        }
        Some(IndexerError::InvalidName(_)) => ErrorEnvelope::new("invalid_name", err.to_string()),
        _ => ErrorEnvelope::new("internal", format!("{err:#}")),
    }
}

pub async fn main_entry() -> Result<ExitCode> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = IndexConfig::from_env();
    if let Some(root) = &cli.root {
        config = config.with_root(root);
    }
    log::debug!("Prompt root: {}", config.root.display());
    let files = PromptFiles::new(config);

    let outcome = run(&cli, &files).await;
    files.shutdown();

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            if cli.json {
                print_stdout(&serialize_json(&error_envelope(&err))?)?;
            } else {
                eprintln!("Error: {err:#}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: &Cli, files: &PromptFiles) -> Result<()> {
    let json = cli.json;
    match &cli.command {
        Commands::List => command::list(files, json).await,
        Commands::Get(args) => command::get(files, &args.name).await,
        Commands::Meta(args) => command::meta(files, &args.name, json).await,
        Commands::Render(args) => {
            let arguments = args.args.iter().cloned().collect();
            command::render(files, &args.name, &arguments).await
        }
        Commands::Add(args) => {
            let content = match &args.file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::Read::read_to_string(&mut io::stdin(), &mut buf)
                        .context("Failed to read prompt from stdin")?;
                    buf
                }
            };
            let header = command::HeaderFields {
                title: args.title.clone(),
                description: args.description.clone(),
                category: args.category.clone(),
                tags: args.tags.clone(),
            };
            command::add(files, &args.name, content, &header, json).await
        }
        Commands::Delete(args) => command::delete(files, &args.name, json).await,
        Commands::Watch => command::watch(files).await,
    }
}
