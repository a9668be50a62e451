// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive side of the probe.
//!
//! The first frame sets the baseline. Every later frame must carry the
//! previous value plus one (modulo 2^64). A frame that does not is reported
//! and becomes the new baseline, unless quit-on-mismatch is set.
//!
//! The reported gap is `received - expected` modulo 2^64, shown signed. It
//! is only an estimate of lost frames: duplicates and reordering give zero,
//! negative or huge values.

use crate::config::RunConfig;
use crate::error::ProbeError;
use crate::frame::Frame;
use crate::shutdown::ShutdownController;
use crate::stats::{Statistics, StatsReporter};
use crate::transport::{RecvStatus, Transport};
use std::io::Write;
use std::time::Duration;

/// Receive timeout; bounds how long a cancellation can go unnoticed.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Receiver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Waiting for the first frame.
    Init,
    Tracking,
    Stopped,
    Failed,
}

/// Classification of one received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// First frame of the run, adopted without classification.
    Baseline(u64),
    InSequence(u64),
    /// Unexpected value; the receiver resynced to `received`.
    OutOfSequence {
        expected: u64,
        received: u64,
        gap: i64,
    },
}

/// Sequence frame verifier.
pub struct Receiver<'a> {
    config: &'a RunConfig,
    shutdown: ShutdownController,
    expected: u64,
    state: RxState,
}

impl<'a> Receiver<'a> {
    pub fn new(config: &'a RunConfig, shutdown: ShutdownController) -> Self {
        Self {
            config,
            shutdown,
            expected: 0,
            state: RxState::Init,
        }
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    /// Sequence number the next frame must carry, once a baseline exists.
    pub fn expected(&self) -> Option<u64> {
        match self.state {
            RxState::Init => None,
            _ => Some(self.expected),
        }
    }

    /// Receive until cancelled, the loop count is exhausted, or a fatal
    /// error. Only processed frames count against the loop count.
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
        let result = self.receive_loop(transport, stats, reporter);
        self.state = if result.is_ok() {
            RxState::Stopped
        } else {
            RxState::Failed
        };
        result
    }

    fn receive_loop<T, W>(
        &mut self,
        transport: &mut T,
        stats: &mut Statistics,
        reporter: &mut StatsReporter<W>,
    ) -> Result<(), ProbeError>
    where
        T: Transport + ?Sized,
        W: Write,
    {
        let mut processed = 0u64;

        while self.config.loop_count.allows(processed) && !self.shutdown.is_cancelled() {
            match transport.receive(RECEIVE_TIMEOUT)? {
                RecvStatus::Timeout => reporter.poll(stats),
                RecvStatus::Interrupted => stats.interrupted_calls += 1,
                RecvStatus::Frame(frame) => {
                    self.handle_frame(&frame, stats)?;
                    processed += 1;
                    reporter.poll(stats);
                }
            }
        }

        Ok(())
    }

    /// Classify one frame and update the counters.
    ///
    /// Fails with [`ProbeError::SequenceMismatch`] on a gap when
    /// quit-on-mismatch is configured; the frame is then not counted.
    pub fn handle_frame(
        &mut self,
        frame: &Frame,
        stats: &mut Statistics,
    ) -> Result<Arrival, ProbeError> {
        let received = frame.sequence();
        if self.config.verbosity > 1 {
            tracing::info!("received frame. seq number: {:x}", received);
        }

        let arrival = if self.state == RxState::Init {
            self.state = RxState::Tracking;
            Arrival::Baseline(received)
        } else if received == self.expected {
            stats.in_sequence_streak += 1;
            Arrival::InSequence(received)
        } else {
            let expected = self.expected;
            let gap = received.wrapping_sub(expected) as i64;
            tracing::warn!(
                "received wrong seq count. expected: {:x}, got: {:x} missing: {}",
                expected,
                received,
                gap
            );
            if self.config.quit_on_mismatch {
                return Err(ProbeError::SequenceMismatch { expected, received });
            }
            stats.in_sequence_streak = 0;
            stats.out_of_sequence_total += 1;
            Arrival::OutOfSequence {
                expected,
                received,
                gap,
            }
        };

        stats.frames_received += 1;
        self.expected = received.wrapping_add(1);

        if self.expected == 0 {
            if self.config.verbosity > 0 {
                tracing::info!("seq wrap around ({})", stats.wrap_arounds);
            }
            stats.wrap_arounds += 1;
        }

        Ok(arrival)
    }
}
