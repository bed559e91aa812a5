use clap::Subcommand;
use std::path::PathBuf;

pub mod cache;
pub mod key;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore the artifact stored under KEY to OUTPUT
    Fetch {
        /// Rule key (hex digest)
        key: String,

        /// Where to write the artifact
        output: PathBuf,
    },

    /// Store FILE in the cache under KEY
    Store {
        /// Rule key (hex digest)
        key: String,

        /// Artifact to store
        file: PathBuf,
    },

    /// Print the content key of FILE
    Key {
        /// File to hash
        file: PathBuf,
    },
}

impl Commands {
    /// Name used for command lifecycle events
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Fetch { .. } => "fetch",
            Commands::Store { .. } => "store",
            Commands::Key { .. } => "key",
        }
    }
}
