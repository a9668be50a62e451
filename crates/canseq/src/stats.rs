// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Run statistics and the periodic statistics table.

use crate::config::Role;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Data rows between header repeats.
const HEADER_EVERY: u64 = 10;

/// Counters for one probe run.
///
/// Owned and mutated by the active loop only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Frames successfully sent.
    pub frames_sent: u64,
    /// Frames received (in or out of sequence).
    pub frames_received: u64,
    /// Frames received in sequence since the last gap.
    pub in_sequence_streak: u64,
    /// Frames received out of sequence.
    pub out_of_sequence_total: u64,
    /// Send/receive calls interrupted by a signal.
    pub interrupted_calls: u64,
    /// Sends refused because the transmit buffer was full.
    pub backpressure_events: u64,
    /// Sequence counter wrap-arounds.
    pub wrap_arounds: u64,
}

impl Statistics {
    /// Table columns for `role`, as shown in a data row.
    pub fn columns(&self, role: Role) -> [u64; 3] {
        match role {
            Role::Send => [
                self.frames_sent,
                self.interrupted_calls,
                self.backpressure_events,
            ],
            Role::Receive => [
                self.frames_received,
                self.in_sequence_streak,
                self.out_of_sequence_total,
            ],
        }
    }
}

/// Prints the statistics table at a fixed wall-clock cadence.
///
/// Not a timer: the active loop polls it once per iteration and it emits a
/// row when at least `interval` has passed since the previous one.
pub struct StatsReporter<W: Write> {
    role: Role,
    interval: Option<Duration>,
    last_emit: Option<Instant>,
    rows: u64,
    out: W,
}

impl StatsReporter<io::Stderr> {
    /// Reporter writing to stderr.
    pub fn stderr(role: Role, interval: Option<Duration>) -> Self {
        Self::new(role, interval, io::stderr())
    }
}

impl<W: Write> StatsReporter<W> {
    /// `interval = None` disables periodic rows; the final snapshot is
    /// still printed.
    pub fn new(role: Role, interval: Option<Duration>, out: W) -> Self {
        Self {
            role,
            interval,
            last_emit: None,
            rows: 0,
            out,
        }
    }

    /// Poll using the current time.
    pub fn poll(&mut self, stats: &Statistics) {
        self.poll_at(Instant::now(), stats);
    }

    /// Poll as if the current time were `now`.
    ///
    /// Returns `true` if a data row was written. The first poll only starts
    /// the interval clock.
    pub fn poll_at(&mut self, now: Instant, stats: &Statistics) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let last = *self.last_emit.get_or_insert(now);
        if now.saturating_duration_since(last) < interval {
            return false;
        }

        if self.rows % HEADER_EVERY == 0 {
            self.write_header();
        }
        self.write_row(stats);
        self.rows += 1;
        self.last_emit = Some(now);
        true
    }

    /// Print the separator, header and current counters unconditionally.
    pub fn final_snapshot(&mut self, stats: &Statistics) {
        self.write_line(format_args!("{}", "-".repeat(43)));
        self.write_header();
        self.write_row(stats);
        let _ = self.out.flush();
    }

    /// Data rows written by [`poll_at`](Self::poll_at) so far.
    pub fn rows_emitted(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) {
        let (top, bottom) = match self.role {
            Role::Send => (["sent", "", ""], ["total", "EINTR", "ENOBUFS"]),
            Role::Receive => (
                ["received", "received", "received"],
                ["total", "last in seq", "total OOS"],
            ),
        };
        self.write_line(format_args!("{:>12} {:>12} {:>12}", top[0], top[1], top[2]));
        self.write_line(format_args!(
            "{:>12} {:>12} {:>12}",
            bottom[0], bottom[1], bottom[2]
        ));
    }

    fn write_row(&mut self, stats: &Statistics) {
        let [a, b, c] = stats.columns(self.role);
        self.write_line(format_args!("{:>12} {:>12} {:>12}", a, b, c));
    }

    fn write_line(&mut self, line: std::fmt::Arguments<'_>) {
        // The table is best effort; a closed stderr must not end the run.
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::trace!("statistics output failed: {}", e);
        }
    }
}
