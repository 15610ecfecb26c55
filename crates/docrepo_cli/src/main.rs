use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| docrepo_core::default_log_level());
        docrepo_core::init_logging(level, log_dir).context("cannot start logging")?;
    }

    commands::run_command(cli)
}
