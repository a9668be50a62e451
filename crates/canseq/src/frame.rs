// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CAN identifiers, sequence frames and receive filters.

use crate::codec::{self, PAYLOAD_LEN};
use std::fmt;

/// Extended frame format flag (bit 31 of a raw SocketCAN id).
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;

/// Valid bits of an extended (29-bit) identifier.
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Valid bits of a standard (11-bit) identifier.
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;

/// Default probe identifier.
pub const DEFAULT_CAN_ID: u32 = 0x2222_2222;

/// Identifier addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// 11-bit identifiers.
    Standard,
    /// 29-bit identifiers.
    Extended,
}

impl Addressing {
    /// Mask of the identifier bits that exist in this mode.
    pub const fn mask(self) -> u32 {
        match self {
            Self::Standard => CAN_SFF_MASK,
            Self::Extended => CAN_EFF_MASK,
        }
    }
}

/// A CAN identifier already reduced to its addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanId {
    raw: u32,
    addressing: Addressing,
}

impl CanId {
    /// Build an identifier, discarding bits the addressing mode cannot carry.
    pub const fn new(raw: u32, addressing: Addressing) -> Self {
        Self {
            raw: raw & addressing.mask(),
            addressing,
        }
    }

    /// Build a standard identifier.
    pub const fn standard(raw: u32) -> Self {
        Self::new(raw, Addressing::Standard)
    }

    /// Build an extended identifier.
    pub const fn extended(raw: u32) -> Self {
        Self::new(raw, Addressing::Extended)
    }

    /// Identifier bits, without any format flag.
    pub const fn raw(&self) -> u32 {
        self.raw
    }

    pub const fn addressing(&self) -> Addressing {
        self.addressing
    }

    pub const fn is_extended(&self) -> bool {
        matches!(self.addressing, Addressing::Extended)
    }

    /// Identifier as SocketCAN encodes it (EFF flag set for extended ids).
    pub const fn as_socketcan_id(&self) -> u32 {
        match self.addressing {
            Addressing::Standard => self.raw,
            Addressing::Extended => self.raw | CAN_EFF_FLAG,
        }
    }
}

impl fmt::Display for CanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addressing {
            Addressing::Standard => write!(f, "{:03X}", self.raw),
            Addressing::Extended => write!(f, "{:08X}", self.raw),
        }
    }
}

/// A probe frame: fixed identifier, 8-byte sequence payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub id: CanId,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Frame {
    /// Frame carrying `seq`.
    pub fn with_sequence(id: CanId, seq: u64) -> Self {
        Self {
            id,
            payload: codec::encode(seq),
        }
    }

    /// Build a frame from a received payload of up to 8 bytes.
    ///
    /// Missing trailing bytes read as zero. Returns `None` for payloads
    /// longer than a classic CAN frame.
    pub fn from_data(id: CanId, data: &[u8]) -> Option<Self> {
        if data.len() > PAYLOAD_LEN {
            return None;
        }
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..data.len()].copy_from_slice(data);
        Some(Self { id, payload })
    }

    /// Sequence number carried by this frame.
    pub fn sequence(&self) -> u64 {
        codec::decode(&self.payload)
    }

    /// Replace the payload with `seq`.
    pub fn set_sequence(&mut self, seq: u64) {
        self.payload = codec::encode(seq);
    }
}

/// Receive filter (`id` / `mask` as installed on the socket).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    pub id: u32,
    pub mask: u32,
}

impl Filter {
    /// Filter accepting only frames carrying `id`.
    pub const fn for_id(id: CanId) -> Self {
        Self {
            id: id.as_socketcan_id(),
            mask: id.addressing().mask(),
        }
    }
}
