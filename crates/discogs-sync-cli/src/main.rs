use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, sync};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "discogs-sync")]
#[command(about = "discogs-sync - Snapshot your Discogs collection and wantlist as JSON")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the collection and wantlist and write their JSON snapshots
    #[command(long_about = "Fetch the Discogs collection and wantlist of $DISCOGS_USER (authenticated with $DISCOGS_TOKEN), resolve original release years through the master-year cache and write collection.json and wantlist.json. If no feed flags are given, the feeds enabled in the configuration are synced.")]
    Sync {
        /// Sync the collection
        #[arg(long, action = ArgAction::SetTrue)]
        collection: bool,

        /// Sync the wantlist
        #[arg(long, action = ArgAction::SetTrue)]
        wantlist: bool,

        /// Directory for the snapshots and the master cache
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Configuration file (defaults to $DISCOGS_SYNC_CONFIG or the platform config dir)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Skip master lookups and use each release's own year
        #[arg(long, action = ArgAction::SetTrue)]
        no_cache: bool,

        /// Also write logs to a daily rotated file (the platform log directory when FILE is omitted)
        #[arg(long, value_name = "FILE")]
        log_file: Option<Option<PathBuf>>,
    },
    /// Show configuration
    #[command(long_about = "Inspect the effective configuration. The Discogs token is masked unless --full is given.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Remove the master cache and/or the written snapshots
    #[command(long_about = "Clear generated data. Use --cache to remove the master-year cache, --snapshots to remove collection.json and wantlist.json, or --all for both.")]
    Clear {
        /// Clear the cache and the snapshots
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear the master-year cache
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Clear the snapshot documents
        #[arg(long, action = ArgAction::SetTrue)]
        snapshots: bool,

        /// Directory holding the snapshots and the cache
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the token)
    Show {
        /// Show the token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,

        /// Configuration file to read
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Write a configuration file with every default spelled out
    Init {
        /// Where to write it (defaults to $DISCOGS_SYNC_CONFIG or the platform config dir)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Sync { log_file: Some(Some(path)), .. } => Some(path.clone()),
        Commands::Sync { log_file: Some(None), output_dir, config, .. } => {
            sync::default_log_file(output_dir.clone(), config.clone())
        }
        _ => None,
    };
    if let Err(e) = logging::init_logging_with_file(cli.verbose, cli.quiet, log_file) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Sync {
            collection,
            wantlist,
            output_dir,
            config,
            no_cache,
            log_file: _,
        } => sync::run_sync(collection, wantlist, output_dir, config, no_cache, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
        Commands::Clear { all, cache, snapshots, output_dir } => clear::run_clear(all, cache, snapshots, output_dir, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            output.error(e.to_string());
            ExitCode::FAILURE
        }
    }
}
