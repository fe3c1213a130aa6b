//! Command-line front end for DELTAHUB mod packages.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use deltahub_config::Loader;
use exn::ResultExt;
use tracing_subscriber::EnvFilter;

use crate::error::ErrorKind;

/// Pack, unpack and convert DELTAHUB mod packages
#[derive(Parser)]
#[command(name = "deltahub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Explicit config file, layered above the platform config directory
    #[arg(long, short = 'c', global = true, env = "DELTAHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what an archive contains and how its files were matched
    Inspect {
        /// Mod archive (canonical or foreign)
        archive: PathBuf,
    },

    /// Convert any supported archive into a canonical one
    Convert {
        archive: PathBuf,

        /// Output archive
        #[arg(short = 'o', long)]
        output: PathBuf,
    },

    /// Build an archive from a config file and payload files
    Pack {
        /// Canonical `mod_config.json`
        config: PathBuf,

        /// Bind a file to a slot, e.g. `1:data_file=./data.xdelta`
        #[arg(short = 's', long = "slot", value_name = "SLOT=FILE")]
        slots: Vec<String>,

        /// Output archive
        #[arg(short = 'o', long)]
        output: PathBuf,
    },

    /// Secret key helpers
    #[command(subcommand)]
    Key(KeyCommands),

    /// Talk to the publishing service
    #[command(subcommand)]
    Remote(RemoteCommands),
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Print a fresh secret key
    Generate,
    /// Print the digest the service stores for a key
    Hash { key: String },
}

#[derive(Subcommand)]
enum RemoteCommands {
    /// Print the public (or pending) config owned by a secret key
    Fetch { key: String },
    /// Submit an archive's config as a new mod, or as a change with `--key`
    Submit {
        archive: PathBuf,

        #[arg(short = 'k', long)]
        key: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let mut loader = Loader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let settings = loader.load().map_err(ErrorKind::config)?;

    match cli.command {
        Commands::Inspect { archive } => commands::inspect(&archive).await,
        Commands::Convert { archive, output } => commands::convert(&archive, &output).await,
        Commands::Pack { config, slots, output } => {
            let bindings = slots.iter().map(|raw| commands::parse_binding(raw)).collect::<error::Result<Vec<_>>>()?;
            commands::pack(&config, &bindings, &output, &settings.package).await
        },
        Commands::Key(KeyCommands::Generate) => {
            println!("{}", deltahub_remote::SecretKey::generate());
            Ok(())
        },
        Commands::Key(KeyCommands::Hash { key }) => {
            let key = key.parse::<deltahub_remote::SecretKey>().map_err(ErrorKind::remote)?;
            println!("{}", key.digest());
            Ok(())
        },
        Commands::Remote(command) => {
            let api = commands::connect(&settings.remote)?;
            match command {
                RemoteCommands::Fetch { key } => {
                    let package = commands::fetch(&api, &key).await?;
                    let text = serde_json::to_string_pretty(&package)
                        .or_raise(|| ErrorKind::InvalidArgument("package can not be printed".to_string()))?;
                    println!("{text}");
                },
                RemoteCommands::Submit { archive, key } => {
                    if let Some(key) = commands::submit(&api, &archive, key.as_deref()).await? {
                        println!("{key}");
                    }
                },
            }
            Ok(())
        },
    }
}
