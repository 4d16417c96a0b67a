//! cfgdrift CLI: the `cfgdrift` command.

mod cli;
mod commands;
mod config;
mod logging;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            instance_id,
            app_id,
            config,
            json,
        } => commands::validate::run(instance_id, app_id, config, json),

        Commands::Check { dir, config, json } => commands::check::run(dir, config, json),
    }
}
