// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! canseq CLI
//!
//! Sends CAN frames with a rising sequence number as payload, or (with
//! `--receive`) verifies such a stream and reports wrong sequence numbers.
//!
//! # Usage
//!
//! ```bash
//! # Send forever on can0 with the default identifier
//! canseq
//!
//! # Receive on vcan0, quit on the first gap, statistics every second
//! canseq vcan0 --receive --quit --stat 1
//!
//! # Send 10000 extended frames, 200us apart, waiting for buffer space
//! canseq vcan0 -e -p -s 200 --loop 10000
//!
//! # Settings from a file, interface overridden on the command line
//! canseq can1 --config probe.toml
//! ```

use canseq::config::parse_identifier;
use canseq::{open_and_run, report_setup_failure, ProbeError, Role, RunConfig};
use canseq::{ShutdownController, StatsReporter};
use canseq::{LoopCount, Transport, TransportError};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CAN link reliability probe
#[derive(Parser, Debug)]
#[command(name = "canseq")]
#[command(version)]
#[command(about = "Send or verify CAN frames carrying a rising sequence number")]
#[command(
    long_about = "canseq sends CAN messages with a rising sequence number as payload.\n\
                  With --receive it expects to receive these messages and reports every\n\
                  wrong sequence number. The main purpose of this program is to test the\n\
                  reliability of CAN links."
)]
struct Cli {
    /// CAN interface [default: can0]
    interface: Option<String>,

    /// Send extended frames (29-bit identifier)
    #[arg(short, long)]
    extended: bool,

    /// CAN identifier: decimal, 0x-prefixed hex or 0-prefixed octal [default: 0x22222222]
    #[arg(short, long, value_name = "ID", value_parser = parse_identifier)]
    identifier: Option<u32>,

    /// Work as receiver
    #[arg(short, long)]
    receive: bool,

    /// Send (or verify) COUNT frames, then exit
    #[arg(long = "loop", value_name = "COUNT")]
    loop_count: Option<u64>,

    /// Wait for buffer space instead of failing when the transmit queue is full
    #[arg(short, long)]
    poll: bool,

    /// Sleep US microseconds before each send
    #[arg(short, long, value_name = "US")]
    sleep: Option<u64>,

    /// Display statistics every INTERVAL seconds
    #[arg(short = 't', long = "stat", value_name = "INTERVAL")]
    stat: Option<u64>,

    /// Quit if a wrong sequence number is encountered
    #[arg(short, long)]
    quit: bool,

    /// Be verbose (twice to log every frame)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Load run settings from a TOML file (command-line flags take precedence)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "canseq=info",
        1 => "canseq=debug",
        _ => "canseq=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            // Role as far as the command line tells it
            let role = if cli.receive { Role::Receive } else { Role::Send };
            let mut reporter = StatsReporter::stderr(role, None);
            std::process::exit(report_setup_failure(role, e, &mut reporter).exit_code());
        }
    };

    std::process::exit(run(&config));
}

/// Layer command-line flags over the optional config file.
fn build_config(cli: &Cli) -> Result<RunConfig, ProbeError> {
    let mut config = match cli.config {
        Some(ref path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(ref interface) = cli.interface {
        config.interface = interface.clone();
    }
    if let Some(identifier) = cli.identifier {
        config.identifier = identifier;
    }
    if let Some(count) = cli.loop_count {
        config.loop_count = LoopCount::Finite(count);
    }
    if let Some(sleep) = cli.sleep {
        config.pacing_micros = sleep;
    }
    if let Some(stat) = cli.stat {
        config.stats_interval_secs = Some(stat);
    }
    if cli.receive {
        config.role = Role::Receive;
    }
    config.extended |= cli.extended;
    config.backpressure_wait |= cli.poll;
    config.quit_on_mismatch |= cli.quit;
    if cli.verbose > 0 {
        config.verbosity = cli.verbose.min(2);
    }

    config.validate()?;
    Ok(config)
}

fn run(config: &RunConfig) -> i32 {
    let mut reporter = StatsReporter::stderr(config.role, config.stats_interval());

    let shutdown = ShutdownController::new();
    if let Err(e) = shutdown.install_signal_handler() {
        return report_setup_failure(config.role, e.into(), &mut reporter).exit_code();
    }

    tracing::info!(
        interface = %config.interface,
        role = ?config.role,
        id = %config.can_id(),
        extended = config.extended,
        "canseq v{}",
        env!("CARGO_PKG_VERSION")
    );

    let report = open_and_run(config, open_transport, &shutdown, &mut reporter);

    tracing::debug!(
        frames_sent = report.stats.frames_sent,
        frames_received = report.stats.frames_received,
        out_of_sequence = report.stats.out_of_sequence_total,
        wrap_arounds = report.stats.wrap_arounds,
        cancelled = report.cancelled,
        "Probe finished"
    );

    report.exit_code()
}

#[cfg(target_os = "linux")]
fn open_transport(config: &RunConfig) -> Result<Box<dyn Transport>, TransportError> {
    let transport = canseq::transport::SocketCanTransport::open(config)?;
    tracing::debug!("Bound to {}", transport.interface());
    Ok(Box::new(transport))
}

#[cfg(not(target_os = "linux"))]
fn open_transport(_config: &RunConfig) -> Result<Box<dyn Transport>, TransportError> {
    Err(TransportError::Unsupported)
}
