use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lfs::CheckpointPolicy;

#[derive(Parser)]
#[command(version, about = "Build and inspect log-structured file system images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an image holding the given files in its root directory
    Build {
        /// Output image
        image: PathBuf,

        /// Files to copy into the image
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// How the second checkpoint slot is used
        #[arg(long, value_enum, default_value_t = Policy::Reserved)]
        checkpoint_policy: Policy,
    },

    /// Print the superblock, the live checkpoint and the root directory
    Inspect {
        /// Image to read
        image: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Commit to the first slot and keep the second one zeroed
    Reserved,
    /// Commit to both slots in turn
    Alternating,
}

impl From<Policy> for CheckpointPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Reserved => Self::Reserved,
            Policy::Alternating => Self::Alternating,
        }
    }
}
