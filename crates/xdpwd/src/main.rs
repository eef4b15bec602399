//! xdpwd entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xdpwd::cli::{Cli, LogLevel};
use xdpwd::lock::InstanceLock;
use xdpwd::reactor;
use xdpwd::state::{bootstrap, Connectors};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.loglevel);

    // Held for the whole process lifetime; the OS releases it on exit.
    let _lock = InstanceLock::acquire(cli.replace)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "portal daemon starting"
    );

    let mut state = bootstrap(&cli.config(), Connectors::system())?;
    info!("bootstrap complete, entering event loop");

    reactor::run(&mut state)?;
    Ok(())
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
