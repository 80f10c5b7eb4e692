use anyhow::{Context, Result};
use clap::Parser;

use cldgallery::cli::{self, Cli, Command};
use cldgallery::server;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cldgallery=info".parse()?),
        )
        .init();

    let opts = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    match opts.command {
        Command::Serve(args) => runtime.block_on(server::run(args)),
        Command::Browse(args) => runtime.block_on(cli::browse(args)),
        Command::Layout(args) => cli::layout(args),
    }
}
