mod cli;
mod commands;
mod settings;

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use settings::Settings;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.data_dir, cli.assets_dir)?;
    commands::run(cli.command, &settings, &mut io::stdout().lock())
}
