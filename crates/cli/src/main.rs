mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rocketblend_lib::addons::{Addon, AddonSource};
use rocketblend_lib::installs::Installation;
use rocketblend_lib::platform::paths::db_dir;
use rocketblend_lib::settings::SettingsRepository;
use rocketblend_lib::store::Store;

use crate::cmd::{
  cmd_addon_add, cmd_addon_list, cmd_addon_remove, cmd_config_get, cmd_config_list, cmd_config_set, cmd_db_prune,
  cmd_db_status, cmd_install_add, cmd_install_list, cmd_install_remove, cmd_remote_add, cmd_remote_list,
  cmd_remote_remove,
};
use crate::output::{OutputFormat, Tone, say};

/// rkb - manage local Blender installations
#[derive(Parser)]
#[command(name = "rkb")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  /// Database directory (default: $ROCKETBLEND_DB_DIR or <data dir>/db)
  #[arg(long, global = true)]
  db_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Manage registered installations
  Install {
    #[command(subcommand)]
    command: InstallCommand,
  },

  /// Manage registered addons
  Addon {
    #[command(subcommand)]
    command: AddonCommand,
  },

  /// Manage package library remotes
  Remote {
    #[command(subcommand)]
    command: RemoteCommand,
  },

  /// Read and change settings
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },

  /// Inspect and maintain the database
  Db {
    #[command(subcommand)]
    command: DbCommand,
  },
}

#[derive(Subcommand)]
enum InstallCommand {
  /// Register an installed build
  Add {
    /// Installation id (e.g. blender-4.1)
    id: String,

    /// Directory the build is installed in
    #[arg(long)]
    path: PathBuf,

    /// Build version
    #[arg(long)]
    version: String,

    /// Checksum of the installed archive
    #[arg(long, default_value = "")]
    hash: String,
  },

  /// List registered installations
  List,

  /// Forget a registered installation
  Remove {
    /// Installation id
    id: String,
  },
}

#[derive(Subcommand)]
enum AddonCommand {
  /// Register an addon
  Add {
    /// Addon id (e.g. node-wrangler)
    id: String,

    /// Addon version
    #[arg(long)]
    version: String,

    /// Display name (defaults to the id)
    #[arg(long)]
    name: Option<String>,

    /// Package reference the addon was resolved from
    #[arg(long, default_value = "")]
    reference: String,

    /// Download URL of the addon archive
    #[arg(long, default_value = "")]
    url: String,

    /// File name of the downloaded archive
    #[arg(long, default_value = "")]
    file: String,
  },

  /// List registered addons
  List,

  /// Forget a registered addon
  Remove {
    /// Addon id
    id: String,
  },
}

#[derive(Subcommand)]
enum RemoteCommand {
  /// Add a remote, replacing any remote with the same name
  Add { name: String, url: String },

  /// List remotes
  List,

  /// Remove a remote
  Remove { name: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
  /// Show every setting
  List,

  /// Show one setting
  Get { key: String },

  /// Change one setting
  Set { key: String, value: String },
}

#[derive(Subcommand)]
enum DbCommand {
  /// Show collections and record counts
  Status,

  /// Remove temp files left behind by interrupted writes
  Prune,
}

fn main() {
  let cli = Cli::parse();

  let root = cli.db_dir.clone().unwrap_or_else(db_dir);
  let store = Store::open(&root).with_context(|| format!("Failed to open database at {}", root.display()));

  init_tracing(cli.verbose, store.as_ref().ok());
  debug!(root = ?root, "opened database");

  if let Err(e) = store.and_then(|store| run(cli, &store)) {
    say(Tone::Fail, &format!("{:#}", e));
    std::process::exit(1);
  }
}

/// `RUST_LOG` wins, then `--verbose`, then the stored `logLevel` setting.
fn init_tracing(verbose: bool, store: Option<&Store>) {
  let level = if verbose {
    "debug".to_string()
  } else {
    store
      .and_then(|store| SettingsRepository::new(store).find().ok().flatten())
      .map(|settings| settings.log_level)
      .unwrap_or_else(|| "warn".to_string())
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli, store: &Store) -> Result<()> {
  let output = cli.output;

  match cli.command {
    Commands::Install { command } => match command {
      InstallCommand::Add {
        id,
        path,
        version,
        hash,
      } => cmd_install_add(
        store,
        &Installation {
          id,
          path,
          version,
          hash,
        },
        output,
      ),
      InstallCommand::List => cmd_install_list(store, cli.verbose, output),
      InstallCommand::Remove { id } => cmd_install_remove(store, &id, output),
    },
    Commands::Addon { command } => match command {
      AddonCommand::Add {
        id,
        version,
        name,
        reference,
        url,
        file,
      } => {
        let addon = Addon {
          name: name.unwrap_or_else(|| id.clone()),
          id,
          reference,
          addon_version: version,
          source: AddonSource { file, url },
        };
        cmd_addon_add(store, &addon, output)
      }
      AddonCommand::List => cmd_addon_list(store, cli.verbose, output),
      AddonCommand::Remove { id } => cmd_addon_remove(store, &id, output),
    },
    Commands::Remote { command } => match command {
      RemoteCommand::Add { name, url } => cmd_remote_add(store, name, url, output),
      RemoteCommand::List => cmd_remote_list(store, output),
      RemoteCommand::Remove { name } => cmd_remote_remove(store, &name, output),
    },
    Commands::Config { command } => match command {
      ConfigCommand::List => cmd_config_list(store, output),
      ConfigCommand::Get { key } => cmd_config_get(store, &key, output),
      ConfigCommand::Set { key, value } => cmd_config_set(store, &key, &value, output),
    },
    Commands::Db { command } => match command {
      DbCommand::Status => cmd_db_status(store, output),
      DbCommand::Prune => cmd_db_prune(store, output),
    },
  }
}
