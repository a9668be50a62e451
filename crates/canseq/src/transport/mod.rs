// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame transport abstraction
//!
//! A transport is a bound, filtered, bidirectional CAN frame channel.
//! Implementations:
//! - SocketCAN raw socket (Linux)
//! - Scripted in-memory transport (tests, loopback)
//!
//! ## Design Principles
//!
//! - **Blocking I/O** - the probe loops are single threaded
//! - **Tagged outcomes** - conditions the loops retry on (interrupted calls,
//!   full transmit buffer, receive timeout) are statuses, not errors
//! - **Fatal errors only** in the `Err` arm, naming the failing operation

use crate::error::TransportError;
use crate::frame::Frame;
use std::time::Duration;

pub mod scripted;
#[cfg(target_os = "linux")]
pub mod socket;

pub use scripted::ScriptedTransport;
#[cfg(target_os = "linux")]
pub use socket::SocketCanTransport;

/// Result of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// Frame queued for transmission.
    Sent,
    /// Transmit buffer full (ENOBUFS); nothing was queued.
    Backpressure,
    /// A signal interrupted the call; nothing was queued.
    Interrupted,
}

/// Result of a single receive attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvStatus {
    Frame(Frame),
    /// No frame within the timeout.
    Timeout,
    /// A signal interrupted the call.
    Interrupted,
}

/// Transport trait for sending/receiving probe frames
pub trait Transport {
    /// Send one frame (blocking).
    fn send(&mut self, frame: &Frame) -> Result<SendStatus, TransportError>;

    /// Receive one frame, waiting at most `timeout`.
    fn receive(&mut self, timeout: Duration) -> Result<RecvStatus, TransportError>;

    /// Block until the transmit path can accept a frame or `timeout` elapses.
    ///
    /// Returning `Ok` does not guarantee the next send succeeds.
    fn wait_writable(&mut self, timeout: Duration) -> Result<(), TransportError>;
}
