// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Send side of the probe.
//!
//! Streams frames carrying a rising 64-bit counter. A frame counts as sent
//! only when the transport accepts it; interrupted and backpressured
//! attempts are retried with the same payload.

use crate::config::RunConfig;
use crate::error::ProbeError;
use crate::frame::Frame;
use crate::shutdown::ShutdownController;
use crate::stats::{Statistics, StatsReporter};
use crate::transport::{SendStatus, Transport};
use std::io::Write;
use std::time::Duration;

/// Longest single wait for transmit buffer space.
pub const BACKPRESSURE_POLL: Duration = Duration::from_millis(10);

/// Transmitter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Init,
    Sending,
    /// Cancelled or loop count exhausted.
    Stopped,
    /// Unrecoverable transport error or backpressure without waiting.
    Failed,
}

/// Outcome of pushing one frame through the retry loop.
enum Delivery {
    Sent,
    Cancelled,
}

/// Sequence frame sender.
pub struct Transmitter<'a> {
    config: &'a RunConfig,
    shutdown: ShutdownController,
    frame: Frame,
    seq: u64,
    state: TxState,
}

impl<'a> Transmitter<'a> {
    pub fn new(config: &'a RunConfig, shutdown: ShutdownController) -> Self {
        Self::starting_at(config, shutdown, 0)
    }

    /// Transmitter whose first frame carries `seq`.
    pub fn starting_at(config: &'a RunConfig, shutdown: ShutdownController, seq: u64) -> Self {
        Self {
            config,
            shutdown,
            frame: Frame::with_sequence(config.can_id(), seq),
            seq,
            state: TxState::Init,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Sequence number of the next frame to send.
    pub fn next_sequence(&self) -> u64 {
        self.seq
    }

    /// Send until cancelled, the loop count is exhausted, or a fatal error.
    pub fn run<T, W>(
        &mut self,
        transport: &mut T,
        stats: &mut Statistics,
        reporter: &mut StatsReporter<W>,
    ) -> Result<(), ProbeError>
    where
        T: Transport + ?Sized,
        W: Write,
    {
        self.state = TxState::Sending;
        let result = self.send_loop(transport, stats, reporter);
        self.state = if result.is_ok() {
            TxState::Stopped
        } else {
            TxState::Failed
        };
        result
    }

    fn send_loop<T, W>(
        &mut self,
        transport: &mut T,
        stats: &mut Statistics,
        reporter: &mut StatsReporter<W>,
    ) -> Result<(), ProbeError>
    where
        T: Transport + ?Sized,
        W: Write,
    {
        let mut sent = 0u64;

        while self.config.loop_count.allows(sent) && !self.shutdown.is_cancelled() {
            if self.config.verbosity > 1 {
                tracing::info!("sending frame. seq number: {:x}", self.seq);
            }

            match self.deliver(transport, stats, reporter)? {
                Delivery::Sent => {}
                Delivery::Cancelled => break,
            }

            sent += 1;
            stats.frames_sent += 1;
            self.advance(stats);
        }

        Ok(())
    }

    /// Retry the current frame until the transport takes it.
    fn deliver<T, W>(
        &mut self,
        transport: &mut T,
        stats: &mut Statistics,
        reporter: &mut StatsReporter<W>,
    ) -> Result<Delivery, ProbeError>
    where
        T: Transport + ?Sized,
        W: Write,
    {
        loop {
            reporter.poll(stats);
            if let Some(pacing) = self.config.pacing() {
                spin_sleep::sleep(pacing);
            }

            match transport.send(&self.frame)? {
                SendStatus::Sent => return Ok(Delivery::Sent),
                SendStatus::Backpressure => {
                    stats.backpressure_events += 1;
                    if !self.config.backpressure_wait {
                        return Err(ProbeError::Backpressure);
                    }
                    transport.wait_writable(BACKPRESSURE_POLL)?;
                }
                SendStatus::Interrupted => {
                    stats.interrupted_calls += 1;
                }
            }

            if self.shutdown.is_cancelled() {
                return Ok(Delivery::Cancelled);
            }
        }
    }

    fn advance(&mut self, stats: &mut Statistics) {
        self.seq = self.seq.wrapping_add(1);
        self.frame.set_sequence(self.seq);

        if self.seq == 0 {
            if self.config.verbosity > 0 {
                tracing::info!("seq wrap around ({})", stats.wrap_arounds);
            }
            stats.wrap_arounds += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoopCount, Role};
    use crate::testing::capture_logs;
    use crate::transport::ScriptedTransport;

    fn config(loops: u64) -> RunConfig {
        RunConfig {
            role: Role::Send,
            loop_count: LoopCount::Finite(loops),
            ..Default::default()
        }
    }

    fn quiet_reporter() -> StatsReporter<Vec<u8>> {
        StatsReporter::new(Role::Send, None, Vec::new())
    }

    #[test]
    fn test_sends_rising_sequence() {
        let config = config(5);
        let mut tx = Transmitter::new(&config, ShutdownController::new());
        let mut transport = ScriptedTransport::new();
        let mut stats = Statistics::default();

        tx.run(&mut transport, &mut stats, &mut quiet_reporter())
            .expect("run");

        let seqs: Vec<u64> = transport.sent().iter().map(Frame::sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
        assert_eq!(stats.frames_sent, 5);
        assert_eq!(tx.next_sequence(), 5);
        assert_eq!(tx.state(), TxState::Stopped);
        assert!(transport.sent().iter().all(|f| f.id == config.can_id()));
    }

    #[test]
    fn test_interrupted_send_is_retried() {
        let config = config(2);
        let mut tx = Transmitter::new(&config, ShutdownController::new());
        let mut transport = ScriptedTransport::new();
        transport.push_send(SendStatus::Interrupted);
        transport.push_send(SendStatus::Interrupted);
        let mut stats = Statistics::default();

        tx.run(&mut transport, &mut stats, &mut quiet_reporter())
            .expect("run");

        assert_eq!(stats.interrupted_calls, 2);
        assert_eq!(stats.frames_sent, 2);
        assert_eq!(transport.send_attempts(), 4);
        assert_eq!(transport.sent()[0].sequence(), 0);
    }

    #[test]
    fn test_backpressure_without_wait_is_fatal() {
        let config = config(3);
        let mut tx = Transmitter::new(&config, ShutdownController::new());
        let mut transport = ScriptedTransport::new();
        transport.push_send(SendStatus::Sent);
        transport.push_send(SendStatus::Backpressure);
        let mut stats = Statistics::default();

        let err = tx
            .run(&mut transport, &mut stats, &mut quiet_reporter())
            .unwrap_err();

        assert!(matches!(err, ProbeError::Backpressure));
        assert_eq!(tx.state(), TxState::Failed);
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.backpressure_events, 1);
        assert_eq!(transport.waits(), 0);
    }

    #[test]
    fn test_fatal_send_error() {
        let config = config(3);
        let mut tx = Transmitter::new(&config, ShutdownController::new());
        let mut transport = ScriptedTransport::new();
        transport.push_send_error(std::io::ErrorKind::NotConnected);
        let mut stats = Statistics::default();

        let err = tx
            .run(&mut transport, &mut stats, &mut quiet_reporter())
            .unwrap_err();

        assert!(matches!(err, ProbeError::Transport(_)));
        assert_eq!(tx.state(), TxState::Failed);
        assert_eq!(stats.frames_sent, 0);
    }

    #[test]
    fn test_wrap_around_is_not_an_error() {
        let config = RunConfig {
            verbosity: 1,
            ..config(3)
        };
        let mut tx = Transmitter::starting_at(&config, ShutdownController::new(), u64::MAX - 1);
        let mut transport = ScriptedTransport::new();
        let mut stats = Statistics::default();

        tx.run(&mut transport, &mut stats, &mut quiet_reporter())
            .expect("run");

        let seqs: Vec<u64> = transport.sent().iter().map(Frame::sequence).collect();
        assert_eq!(seqs, vec![u64::MAX - 1, u64::MAX, 0]);
        assert_eq!(stats.wrap_arounds, 1);
        assert_eq!(tx.next_sequence(), 1);
    }

    #[test]
    fn test_wrap_notice_needs_verbosity() {
        for (verbosity, logged) in [(0, false), (1, true)] {
            let config = RunConfig {
                verbosity,
                ..config(2)
            };

            let (stats, logs) = capture_logs(|| {
                let mut tx = Transmitter::starting_at(&config, ShutdownController::new(), u64::MAX);
                let mut transport = ScriptedTransport::new();
                let mut stats = Statistics::default();
                tx.run(&mut transport, &mut stats, &mut quiet_reporter())
                    .expect("run");
                stats
            });

            assert_eq!(stats.wrap_arounds, 1);
            assert_eq!(
                logs.contains("seq wrap around"),
                logged,
                "verbosity {}: {:?}",
                verbosity,
                logs
            );
        }
    }

    #[test]
    fn test_cancelled_before_start_sends_nothing() {
        let config = config(10);
        let shutdown = ShutdownController::new();
        shutdown.cancel();
        let mut tx = Transmitter::new(&config, shutdown);
        let mut transport = ScriptedTransport::new();
        let mut stats = Statistics::default();

        tx.run(&mut transport, &mut stats, &mut quiet_reporter())
            .expect("run");

        assert_eq!(transport.send_attempts(), 0);
        assert_eq!(tx.state(), TxState::Stopped);
    }

    #[test]
    fn test_zero_loop_count_sends_nothing() {
        let config = config(0);
        let mut tx = Transmitter::new(&config, ShutdownController::new());
        let mut transport = ScriptedTransport::new();
        let mut stats = Statistics::default();

        tx.run(&mut transport, &mut stats, &mut quiet_reporter())
            .expect("run");
        assert_eq!(transport.send_attempts(), 0);
    }
}
