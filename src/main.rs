mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use secure_pillar::Settings;

#[derive(Parser)]
#[command(name = "secure-pillar")]
#[command(version)]
#[command(about = "PGP encryption of individual pillar values", long_about = None)]
struct Cli {
    /// Public key ring (overrides configuration)
    #[arg(long, global = true)]
    pubring: Option<PathBuf>,

    /// Secret key ring (overrides configuration)
    #[arg(long, global = true)]
    secring: Option<PathBuf>,

    /// Settings file (default: ./secure-pillar.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt plaintext to a public key
    Encrypt {
        /// Read plaintext from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Key ID, fingerprint or user ID (default: pgp_key_name)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Decrypt an armored value
    Decrypt {
        /// Read the armored value from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Re-encrypt armored files in place to a new key
    Rotate {
        /// Key to rotate to
        #[arg(short, long)]
        key: String,

        /// Armored files to rotate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show which secret key can decrypt a value
    Keys {
        /// Read the armored value from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Ask gpg for the key's user IDs and subkeys
        #[arg(long)]
        details: bool,
    },

    /// Print the effective settings
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let mut settings = Settings::load(cli.config.as_deref(), &cwd)?;

    if let Some(pubring) = cli.pubring {
        settings.public_key_ring = pubring;
    }
    if let Some(secring) = cli.secring {
        settings.secret_key_ring = secring;
    }

    match cli.command {
        Commands::Encrypt { file, key } => commands::encrypt(&settings, file.as_deref(), key),
        Commands::Decrypt { file } => commands::decrypt(&settings, file.as_deref()),
        Commands::Rotate { key, files } => commands::rotate(&settings, &key, &files),
        Commands::Keys { file, details } => commands::keys(&settings, file.as_deref(), details),
        Commands::Config => commands::show_config(&settings),
    }
}
