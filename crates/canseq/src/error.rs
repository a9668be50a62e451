// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Probe error types.
//!
//! Recoverable conditions (interrupted calls, waited-out backpressure,
//! resynced sequence gaps) never become errors; they are absorbed by the
//! loops and only show up in [`Statistics`](crate::stats::Statistics).

use crate::config::ConfigError;
use thiserror::Error;

/// Unrecoverable transport failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A socket call failed. `op` names the failing operation.
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("SocketCAN is not available on this platform")]
    Unsupported,
}

impl TransportError {
    pub fn io(op: &'static str, source: std::io::Error) -> Self {
        Self::Io { op, source }
    }
}

/// Errors that terminate a probe run.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("write: transmit buffer full (use --poll to wait for buffer space)")]
    Backpressure,

    #[error("received wrong sequence: expected {expected:x}, got {received:x}")]
    SequenceMismatch { expected: u64, received: u64 },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl ProbeError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
