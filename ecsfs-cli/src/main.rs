// SPDX-License-Identifier: MIT

mod commands;
mod config;
mod utils;

use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "ecsfs", version, about = "ECS150 volume image tool", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./ecsfs.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More output; repeat for per-block tracing
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the directory slot limit
    #[arg(long, global = true)]
    max_files: Option<usize>,

    /// Override the open handle limit
    #[arg(long, global = true)]
    max_open_files: Option<usize>,

    /// Volume image file
    image: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and format a new image
    Format {
        /// Number of data blocks (defaults to the config value)
        #[arg(short, long)]
        data_blocks: Option<u16>,
        /// Also zero every data block
        #[arg(long)]
        full: bool,
    },
    /// Print volume geometry and free space
    Info,
    /// List files
    Ls,
    /// Create an empty file
    Create { name: String },
    /// Delete a file
    Rm { name: String },
    /// Copy a host file into the volume
    Add {
        host: PathBuf,
        /// Name inside the volume (defaults to the host file name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print a file to stdout
    Cat { name: String },
    /// Print a file's size
    Stat { name: String },
    /// Write text into a file at an offset
    Write {
        name: String,
        #[arg(short, long, default_value_t = 0)]
        offset: u64,
        text: String,
    },
    /// Verify volume consistency
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    utils::log::init(cli.quiet, cli.verbose);

    let cfg = Config::load(cli.config.as_deref())?.with_overrides(cli.max_files, cli.max_open_files);
    let image = cli.image.as_path();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Format { data_blocks, full } => commands::format(image, &cfg, data_blocks, full)?,
        Commands::Info => commands::info(image, &cfg, &mut stdout)?,
        Commands::Ls => commands::ls(image, &cfg, &mut stdout)?,
        Commands::Create { name } => commands::create(image, &cfg, &name)?,
        Commands::Rm { name } => commands::remove(image, &cfg, &name)?,
        Commands::Add { host, name } => commands::add(image, &cfg, &host, name.as_deref())?,
        Commands::Cat { name } => commands::cat(image, &cfg, &name, &mut stdout)?,
        Commands::Stat { name } => commands::stat(image, &cfg, &name, &mut stdout)?,
        Commands::Write { name, offset, text } => commands::write(image, &cfg, &name, offset, &text)?,
        Commands::Check => commands::check(image, &cfg, cli.verbose > 0, &mut stdout)?,
    }

    Ok(())
}
