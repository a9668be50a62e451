// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Run configuration.
//!
//! Built from command-line flags, optionally layered on top of a TOML file.

use crate::frame::{Addressing, CanId, Filter, DEFAULT_CAN_ID};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Linux limits interface names to IFNAMSIZ - 1 bytes.
const MAX_INTERFACE_LEN: usize = 15;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which side of the link this process drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Send,
    Receive,
}

/// Number of frames a run processes before stopping on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum LoopCount {
    #[default]
    Infinite,
    Finite(u64),
}

impl LoopCount {
    /// Whether another frame may be processed after `done` frames.
    pub fn allows(self, done: u64) -> bool {
        match self {
            Self::Infinite => true,
            Self::Finite(limit) => done < limit,
        }
    }
}

impl From<Option<u64>> for LoopCount {
    fn from(count: Option<u64>) -> Self {
        count.map_or(Self::Infinite, Self::Finite)
    }
}

impl From<LoopCount> for Option<u64> {
    fn from(count: LoopCount) -> Self {
        match count {
            LoopCount::Infinite => None,
            LoopCount::Finite(n) => Some(n),
        }
    }
}

/// Immutable parameters of one probe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// CAN network interface (e.g. `can0`, `vcan0`).
    pub interface: String,

    /// Sender or receiver.
    pub role: Role,

    /// Frame identifier (masked to the addressing mode).
    pub identifier: u32,

    /// Use 29-bit extended identifiers.
    pub extended: bool,

    /// Frames to process; absent means run until interrupted.
    pub loop_count: LoopCount,

    /// Delay before every send attempt (microseconds, 0 = none).
    pub pacing_micros: u64,

    /// Wait for buffer space instead of failing when the bus backs up.
    pub backpressure_wait: bool,

    /// Statistics interval (seconds); absent disables periodic rows.
    pub stats_interval_secs: Option<u64>,

    /// Stop at the first out-of-sequence frame.
    pub quit_on_mismatch: bool,

    /// 0 = quiet, 1 = wrap notices, 2 = every frame.
    pub verbosity: u8,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interface: "can0".to_string(),
            role: Role::Send,
            identifier: DEFAULT_CAN_ID,
            extended: false,
            loop_count: LoopCount::Infinite,
            pacing_micros: 0,
            backpressure_wait: false,
            stats_interval_secs: None,
            quit_on_mismatch: false,
            verbosity: 0,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interface.is_empty() {
            return Err(ConfigError::Invalid("Empty interface name".into()));
        }
        if self.interface.len() > MAX_INTERFACE_LEN {
            return Err(ConfigError::Invalid(format!(
                "Interface name '{}' longer than {} bytes",
                self.interface, MAX_INTERFACE_LEN
            )));
        }
        if self.verbosity > 2 {
            return Err(ConfigError::Invalid(format!(
                "Verbosity {} out of range (0-2)",
                self.verbosity
            )));
        }

        let mask = self.addressing().mask();
        if self.identifier & !mask != 0 {
            tracing::debug!(
                "Identifier 0x{:X} exceeds {:?} range; using 0x{:X}",
                self.identifier,
                self.addressing(),
                self.identifier & mask
            );
        }

        Ok(())
    }

    pub fn addressing(&self) -> Addressing {
        if self.extended {
            Addressing::Extended
        } else {
            Addressing::Standard
        }
    }

    /// Identifier every frame of this run carries.
    pub fn can_id(&self) -> CanId {
        CanId::new(self.identifier, self.addressing())
    }

    /// Receive filter matching [`can_id`](Self::can_id).
    pub fn filter(&self) -> Filter {
        Filter::for_id(self.can_id())
    }

    /// Delay before each send attempt, if any.
    pub fn pacing(&self) -> Option<Duration> {
        (self.pacing_micros > 0).then(|| Duration::from_micros(self.pacing_micros))
    }

    /// Periodic statistics interval, if enabled.
    pub fn stats_interval(&self) -> Option<Duration> {
        self.stats_interval_secs.map(Duration::from_secs)
    }
}

/// Parse an identifier with the same radix prefixes as `strtoul(s, NULL, 0)`:
/// `0x` for hex, leading `0` for octal, decimal otherwise.
///
/// Unlike `strtoul`, the whole string must be valid digits: `"0x"`, `"08"`
/// and trailing garbage are rejected instead of parsing as a prefix.
pub fn parse_identifier(s: &str) -> Result<u32, ConfigError> {
    let s = s.trim();
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    let (digits, radix) = if let Some(hex) = hex {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    u32::from_str_radix(digits, radix)
        .map_err(|e| ConfigError::Invalid(format!("Invalid identifier '{}': {}", s, e)))
}
