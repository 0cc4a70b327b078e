use clap::Parser;
use zest::cli::{run_cli, Cli};
use zest::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
