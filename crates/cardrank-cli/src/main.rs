#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "cardrank",
    author,
    version,
    about = "cardrank: fractional ranking for card boards",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Collection to operate on.
    #[arg(
        long,
        global = true,
        default_value = "default",
        value_parser = parse_collection
    )]
    collection: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

fn parse_collection(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("collection name must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a cardrank project",
        long_about = "Create .cardrank/ with a default config.toml and a migrated rank database.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    cardrank init\n\n    # Reset the config, keeping existing ranks\n    cardrank init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Ranking",
        about = "Rank a new card",
        long_about = "Rank a card for the first time. Without a position it goes to the bottom of the list.",
        after_help = "EXAMPLES:\n    # Append a card\n    cardrank add 12\n\n    # Put a new card directly above card 7\n    cardrank add 12 --before 7\n\n    # Use another board\n    cardrank --collection backlog add 12 --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        name = "move",
        next_help_heading = "Ranking",
        about = "Reposition a ranked card",
        long_about = "Move a card above or below another card, or to the bottom of the list.",
        after_help = "EXAMPLES:\n    # Move card 12 directly above card 7\n    cardrank move 12 --before 7\n\n    # Move card 12 directly below card 7\n    cardrank move 12 --after 7\n\n    # Send card 12 to the bottom\n    cardrank move 12 --last"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Ranking",
        about = "Remove a card from the list",
        long_about = "Delete a card's rank. Other cards keep their ranks; the card's history is kept.",
        after_help = "EXAMPLES:\n    cardrank remove 12\n    cardrank --collection backlog remove 12 --json"
    )]
    Remove(cmd::remove::RemoveArgs),

    #[command(
        next_help_heading = "Read",
        about = "List cards in rank order",
        long_about = "List every ranked card of a collection, smallest rank first.",
        after_help = "EXAMPLES:\n    # Show the board\n    cardrank list\n\n    # Emit machine-readable output\n    cardrank list --json"
    )]
    List,

    #[command(
        next_help_heading = "Read",
        about = "Show one card",
        long_about = "Show a card's rank, position and neighbours.",
        after_help = "EXAMPLES:\n    cardrank show 12\n    cardrank show 12 --format text"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a card's rank history",
        long_about = "Show the recorded rank changes of one card, newest first.",
        after_help = "EXAMPLES:\n    cardrank history 12\n    cardrank history 12 -n 5 --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Check rank bounds and headroom",
        long_about = "Verify every rank lies inside the rank space and report ties and the tightest gap.",
        after_help = "EXAMPLES:\n    cardrank check\n    cardrank --collection backlog check --json"
    )]
    Check,

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    cardrank completions bash > ~/.local/share/bash-completion/completions/cardrank"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CARDRANK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cardrank=debug,info"
        } else {
            "cardrank=info,warn"
        })
    });

    let format = env::var("CARDRANK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    let collection = cli.collection.as_str();
    debug!(?output, collection, "resolved invocation");

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &project_root),
        Commands::Add(ref args) => cmd::add::run_add(args, collection, output, &project_root),
        Commands::Move(ref args) => {
            cmd::move_cmd::run_move(args, collection, output, &project_root)
        }
        Commands::Remove(ref args) => {
            cmd::remove::run_remove(args, collection, output, &project_root)
        }
        Commands::List => cmd::list::run_list(collection, output, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, collection, output, &project_root),
        Commands::History(ref args) => {
            cmd::history::run_history(args, collection, output, &project_root)
        }
        Commands::Check => cmd::check::run_check(collection, output, &project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
