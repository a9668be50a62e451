// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Role dispatch for a probe run.
//!
//! Runs exactly one of [`Transmitter`] or [`Receiver`], then prints the final
//! statistics snapshot whatever the outcome. Failures before the loop starts
//! (config, signal handler, transport open) print an all-zero snapshot.

use crate::config::{Role, RunConfig};
use crate::error::ProbeError;
use crate::receiver::Receiver;
use crate::shutdown::ShutdownController;
use crate::stats::{Statistics, StatsReporter};
use crate::transmitter::Transmitter;
use crate::error::TransportError;
use crate::transport::Transport;
use std::io::Write;
use std::ops::DerefMut;

/// Result of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub role: Role,
    pub stats: Statistics,
    /// The run ended because shutdown was requested.
    pub cancelled: bool,
    pub result: Result<(), ProbeError>,
}

impl RunReport {
    /// Process exit status: 0 for completion or cancellation.
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(()) => 0,
            Err(e) => e.exit_code(),
        }
    }
}

/// Run the configured role to completion.
pub fn run_probe<T, W>(
    config: &RunConfig,
    transport: &mut T,
    shutdown: &ShutdownController,
    reporter: &mut StatsReporter<W>,
) -> RunReport
where
    T: Transport + ?Sized,
    W: Write,
{
    let mut stats = Statistics::default();

    let result = match config.role {
        Role::Send => {
            Transmitter::new(config, shutdown.clone()).run(transport, &mut stats, reporter)
        }
        Role::Receive => {
            Receiver::new(config, shutdown.clone()).run(transport, &mut stats, reporter)
        }
    };

    let cancelled = shutdown.is_cancelled();
    match &result {
        Ok(()) if cancelled => tracing::info!("Probe stopped by signal"),
        Ok(()) => tracing::debug!("Probe finished after loop count"),
        Err(e) => tracing::error!("{}", e),
    }

    reporter.final_snapshot(&stats);

    RunReport {
        role: config.role,
        stats,
        cancelled,
        result,
    }
}

/// Open a transport with `open`, then run the configured role on it.
pub fn open_and_run<F, T, W>(
    config: &RunConfig,
    open: F,
    shutdown: &ShutdownController,
    reporter: &mut StatsReporter<W>,
) -> RunReport
where
    F: FnOnce(&RunConfig) -> Result<T, TransportError>,
    T: DerefMut,
    T::Target: Transport,
    W: Write,
{
    match open(config) {
        Ok(mut transport) => run_probe(config, &mut *transport, shutdown, reporter),
        Err(e) => report_setup_failure(config.role, e.into(), reporter),
    }
}

/// Report a failure that happened before any frame was processed.
pub fn report_setup_failure<W: Write>(
    role: Role,
    error: ProbeError,
    reporter: &mut StatsReporter<W>,
) -> RunReport {
    tracing::error!("{}", error);

    let stats = Statistics::default();
    reporter.final_snapshot(&stats);

    RunReport {
        role,
        stats,
        cancelled: false,
        result: Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, LoopCount};
    use crate::transport::{ScriptedTransport, SendStatus};
    use std::io;

    #[test]
    fn test_send_run_prints_final_snapshot() {
        let config = RunConfig {
            loop_count: LoopCount::Finite(3),
            ..Default::default()
        };
        let mut transport = ScriptedTransport::new();
        let mut reporter = StatsReporter::new(Role::Send, None, Vec::new());

        let report = run_probe(&config, &mut transport, &ShutdownController::new(), &mut reporter);

        assert_eq!(report.exit_code(), 0);
        assert!(!report.cancelled);
        assert_eq!(report.stats.frames_sent, 3);

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.starts_with("---"));
        assert!(text.lines().last().unwrap().trim_start().starts_with('3'));
    }

    #[test]
    fn test_failure_still_prints_snapshot() {
        let config = RunConfig::default();
        let mut transport = ScriptedTransport::new();
        transport.push_send(SendStatus::Backpressure);
        let mut reporter = StatsReporter::new(Role::Send, None, Vec::new());

        let report = run_probe(&config, &mut transport, &ShutdownController::new(), &mut reporter);

        assert_eq!(report.exit_code(), 1);
        assert!(matches!(report.result, Err(ProbeError::Backpressure)));
        assert_eq!(report.stats.backpressure_events, 1);
        assert!(!reporter.into_inner().is_empty());
    }

    #[test]
    fn test_cancelled_receive_exits_cleanly() {
        let config = RunConfig {
            role: Role::Receive,
            ..Default::default()
        };
        let shutdown = ShutdownController::new();
        let mut transport = ScriptedTransport::new().shutdown_when_drained(shutdown.clone());
        let mut reporter = StatsReporter::new(Role::Receive, None, Vec::new());

        let report = run_probe(&config, &mut transport, &shutdown, &mut reporter);

        assert!(report.cancelled);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.role, Role::Receive);
    }

    #[test]
    fn test_open_failure_prints_zero_snapshot() {
        let config = RunConfig {
            role: Role::Receive,
            ..Default::default()
        };
        let interval = Some(std::time::Duration::ZERO);
        let mut reporter = StatsReporter::new(Role::Receive, interval, Vec::new());

        let report = open_and_run(
            &config,
            |_| -> Result<Box<ScriptedTransport>, TransportError> {
                Err(TransportError::io(
                    "open",
                    io::Error::from_raw_os_error(libc::ENODEV),
                ))
            },
            &ShutdownController::new(),
            &mut reporter,
        );

        assert_eq!(report.exit_code(), 1);
        assert!(!report.cancelled);
        assert_eq!(report.stats, Statistics::default());
        match &report.result {
            Err(ProbeError::Transport(e)) => assert!(e.to_string().starts_with("open: ")),
            other => panic!("unexpected result: {:?}", other),
        }

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "-".repeat(43));
        assert!(lines[2].contains("last in seq"));
        assert_eq!(lines[3], "           0            0            0");
    }

    #[test]
    fn test_open_success_runs_role() {
        let config = RunConfig {
            loop_count: LoopCount::Finite(2),
            ..Default::default()
        };
        let mut reporter = StatsReporter::new(Role::Send, None, Vec::new());

        let report = open_and_run(
            &config,
            |_| Ok::<_, TransportError>(Box::new(ScriptedTransport::new())),
            &ShutdownController::new(),
            &mut reporter,
        );

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.stats.frames_sent, 2);
    }

    #[test]
    fn test_config_failure_prints_snapshot() {
        let mut reporter = StatsReporter::new(Role::Send, None, Vec::new());
        let error = ProbeError::Config(ConfigError::Invalid("Empty interface name".into()));

        let report = report_setup_failure(Role::Send, error, &mut reporter);

        assert_eq!(report.exit_code(), 1);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.starts_with("---"));
        assert!(text.contains("ENOBUFS"));
    }
}
