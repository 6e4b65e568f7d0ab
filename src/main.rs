use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tagger::cli::{Release, ReleaseOutcome};
use tagger::config::{self, Config};
use tagger::git::Git2Repository;
use tagger::ui;

#[derive(Parser)]
#[command(
    name = "tagger",
    about = "Bump the version file, commit it and tag the release with a changelog",
    disable_version_flag = true
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        default_value = ".",
        help = "Path of the repository to release"
    )]
    path: PathBuf,

    #[arg(
        short,
        long,
        global = true,
        help = "Version file format (php, yaml, json)"
    )]
    format: Option<String>,

    #[arg(short, long, global = true, help = "Log progress details to stderr")]
    verbose: bool,

    #[arg(short = 'V', long, help = "Print version information")]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full release: sync check, bump, commit and tag (default)
    Release,
    /// Show the released version and the changelog since its tag
    Status,
    /// Tag a release commit left untagged by an interrupted run
    Tag,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = config::load_config(args.config.as_deref(), &args.path)?;
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    Ok(config)
}

fn report_release(outcome: &ReleaseOutcome, config: &Config) {
    ui::display_success(&format!(
        "Released {} (was {})",
        outcome.new_version, outcome.old_version
    ));
    ui::display_manual_push_instruction(
        &outcome.new_version.to_string(),
        &config.remote,
        &config.branch,
    );
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let repo = Git2Repository::open(&args.path)?;
    let release = Release::new(&repo, &config)?;

    match args.command.as_ref().unwrap_or(&Command::Release) {
        Command::Release => {
            let stdin = io::stdin();
            let outcome = release.run(&mut stdin.lock())?;
            report_release(&outcome, &config);
        }
        Command::Status => {
            release.status()?;
        }
        Command::Tag => {
            let outcome = release.resume_tag()?;
            report_release(&outcome, &config);
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.version {
        println!("tagger {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
}
