use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cfgdrift",
    about = "cfgdrift: compare a Db2uInstance's declared configuration with what Db2 reports",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a live instance through kubectl
    Validate {
        /// Db2 instance identifier (namespace db2u-<INSTANCE_ID>)
        instance_id: String,

        /// Application identifier (resource db2wh-<INSTANCE_ID>-<APP_ID>)
        app_id: String,

        /// Path to the cfgdrift TOML config (default: ./cfgdrift.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a saved capture directory without touching a cluster
    Check {
        /// Directory holding db2uinstance.yaml and captured command output
        dir: PathBuf,

        /// Path to the cfgdrift TOML config (only [log] is used)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
