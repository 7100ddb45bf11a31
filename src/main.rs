mod cli;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::task::LocalSet;

#[derive(Parser)]
#[command(
    name = "catstats",
    about = "Headless preview of the cat usage overlay",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the overlay into a sample page and print the result
    Preview {
        /// Overlay config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the statistics endpoint
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Select a range before printing (day|week|month)
        #[arg(short, long)]
        range: Option<String>,

        /// Open the panel (implied when no range is given)
        #[arg(long)]
        open: bool,

        /// Print the cards as plain text instead of the page HTML
        #[arg(long)]
        text: bool,
    },
    /// Manage overlay configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        #[arg(long)]
        path: PathBuf,
    },
    /// Validate a config file
    Check {
        #[arg(long)]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Preview {
            config,
            endpoint,
            range,
            open,
            text,
        } => {
            let opts = cli::output::OutputOptions {
                format: if text {
                    cli::output::OutputFormat::Text
                } else {
                    cli::output::OutputFormat::Html
                },
                verbose: cli.verbose,
            };
            let args = cli::preview_cmd::PreviewArgs {
                config,
                endpoint,
                range,
                open,
            };
            LocalSet::new()
                .run_until(cli::preview_cmd::run(args, &opts))
                .await?;
        }
        Commands::Config { action } => {
            let opts = cli::output::OutputOptions {
                format: cli::output::OutputFormat::Text,
                verbose: cli.verbose,
            };
            match action {
                ConfigAction::Init { path } => cli::config_cmd::init(&path, &opts)?,
                ConfigAction::Check { path } => cli::config_cmd::check(&path, &opts)?,
            }
        }
    }

    Ok(())
}
