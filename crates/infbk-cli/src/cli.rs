use std::path::PathBuf;

use clap::{Parser, Subcommand};

use infbk_types::ObjectId;

#[derive(Parser)]
#[command(
    name = "infbk",
    version,
    about = "Encrypted, portable project graph backups",
    after_help = "\
Configuration file lookup order:
  1. --config <path>             (explicit flag)
  2. $INFBK_CONFIG               (environment variable)
  3. ./infbk.yaml                (working directory)
  4. <user config dir>/infbk/config.yaml
  5. /etc/infbk/config.yaml      (unix only)
Built-in defaults apply when no file is found.

Environment variables:
  INFBK_CONFIG      Path to configuration file (overrides default search)
  INFBK_PASSWORD    Archive password (skips interactive prompt)
  INFBK_STORE       Store path used by the starter config's store.path"
)]
pub(crate) struct Cli {
    /// Path to configuration file (overrides INFBK_CONFIG and default search)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON document store to read from and write to (overrides store.path)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Write an encrypted archive of a project
    Backup {
        /// Project to back up (24-character hex id)
        #[arg(short, long)]
        project: ObjectId,

        /// Requesting user; needs manage_project on the project
        #[arg(short, long)]
        user: ObjectId,

        /// Directory the archive is written to
        #[arg(short, long, default_value = ".")]
        out: String,
    },

    /// Restore an archive as a new project owned by the given user
    Restore {
        /// User who becomes owner of the restored project
        #[arg(short, long)]
        user: ObjectId,

        /// Archive file (.infbk)
        archive: String,
    },

    /// Decrypt an archive and summarize its contents without restoring
    Inspect {
        /// Archive file (.infbk)
        archive: String,
    },

    /// Generate a starter configuration file
    Config {
        /// Destination path (defaults to ./infbk.yaml)
        dest: Option<PathBuf>,
    },
}
