// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequence payload codec.
//!
//! A sequence number travels as the full 8-byte CAN payload, least
//! significant byte first.

/// Payload length of a sequence frame (bytes).
pub const PAYLOAD_LEN: usize = 8;

/// Encode a sequence counter into a little-endian payload.
#[inline]
pub fn encode(seq: u64) -> [u8; PAYLOAD_LEN] {
    seq.to_le_bytes()
}

/// Decode a little-endian payload into a sequence counter.
///
/// Every 8-byte pattern is a valid counter value.
#[inline]
pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> u64 {
    u64::from_le_bytes(*payload)
}
