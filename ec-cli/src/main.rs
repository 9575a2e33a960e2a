//! `ecdiag` entry point

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ec_sim::EcSimulator;
use ec_transport::port::{DevPort, PortTransport, PortTransportConfig};

use crate::cli::Cli;
use crate::commands::{Backend, Timing};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut backend = if cli.sim {
        tracing::debug!("using in-process EC simulator");
        Backend::Sim(EcSimulator::new())
    } else {
        let io = DevPort::open().context("failed to open I/O port device")?;
        let config = PortTransportConfig {
            cmd_port: cli.cmd_port,
            data_port: cli.data_port,
            ..Default::default()
        };
        Backend::Port(PortTransport::new(io, config))
    };

    let timing = Timing {
        wait: cli.wait,
        overall: cli.timeout,
    };
    commands::dispatch(&cli.command, &mut backend, timing)
}

fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_new("warn,ec_transport=debug,ec_protocol=debug,ec_sim=debug,ecdiag=debug")?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}
