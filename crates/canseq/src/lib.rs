// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CAN link reliability probe
//!
//! One side streams frames whose 8-byte payload is a rising 64-bit sequence
//! number; the other side verifies the sequence is unbroken and reports
//! gaps, drops and reordering.
//!
//! # Features
//!
//! - **Sequence streaming**: little-endian 64-bit counter, wraps silently
//! - **Gap detection**: mismatch report and resync, or quit on first gap
//! - **Backpressure handling**: fail fast or wait for transmit buffer space
//! - **Periodic statistics**: fixed-width table on stderr
//! - **Cooperative shutdown**: SIGINT/SIGTERM/SIGHUP stop the loop cleanly
//!
//! # Quick Start
//!
//! ```bash
//! # Receiver, statistics every 2 seconds
//! canseq vcan0 -r -t 2
//!
//! # Sender, extended ids, wait for buffer space, 1000 frames
//! canseq vcan0 -e -p --loop 1000
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! interface = "can1"
//! role = "receive"
//! identifier = 0x123
//! stats_interval_secs = 5
//! quit_on_mismatch = true
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod probe;
pub mod receiver;
pub mod shutdown;
pub mod stats;
pub mod transmitter;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, LoopCount, Role, RunConfig};
pub use error::{ProbeError, TransportError};
pub use frame::{Addressing, CanId, Filter, Frame};
pub use probe::{open_and_run, report_setup_failure, run_probe, RunReport};
pub use receiver::{Arrival, Receiver, RxState};
pub use shutdown::ShutdownController;
pub use stats::{Statistics, StatsReporter};
pub use transmitter::{Transmitter, TxState};
pub use transport::{RecvStatus, ScriptedTransport, SendStatus, Transport};
