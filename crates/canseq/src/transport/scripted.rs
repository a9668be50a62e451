// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scripted in-memory transport.
//!
//! Send and receive outcomes are queued up front; every frame that is
//! accepted by [`Transport::send`] is recorded. Once the send script is
//! empty every send succeeds. Once the receive script is empty every
//! receive times out, and the attached [`ShutdownController`] (if any) is
//! triggered so loops driven by this transport wind down.

use super::{RecvStatus, SendStatus, Transport};
use crate::error::TransportError;
use crate::frame::Frame;
use crate::shutdown::ShutdownController;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

#[derive(Debug)]
enum Scripted<T> {
    Status(T),
    Fail(&'static str, io::ErrorKind),
}

/// In-memory transport driven by queued outcomes.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    sends: VecDeque<Scripted<SendStatus>>,
    receives: VecDeque<Scripted<RecvStatus>>,
    sent: Vec<Frame>,
    send_attempts: u64,
    receive_attempts: u64,
    waits: u64,
    shutdown_when_drained: Option<ShutdownController>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue frames for the receive side.
    pub fn with_frames<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        let mut transport = Self::new();
        for frame in frames {
            transport.push_frame(frame);
        }
        transport
    }

    /// Cancel `shutdown` once the receive script runs dry.
    pub fn shutdown_when_drained(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown_when_drained = Some(shutdown);
        self
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.receives
            .push_back(Scripted::Status(RecvStatus::Frame(frame)));
    }

    pub fn push_receive(&mut self, status: RecvStatus) {
        self.receives.push_back(Scripted::Status(status));
    }

    pub fn push_receive_error(&mut self, kind: io::ErrorKind) {
        self.receives.push_back(Scripted::Fail("read", kind));
    }

    pub fn push_send(&mut self, status: SendStatus) {
        self.sends.push_back(Scripted::Status(status));
    }

    pub fn push_send_error(&mut self, kind: io::ErrorKind) {
        self.sends.push_back(Scripted::Fail("write", kind));
    }

    /// Frames accepted so far, in send order.
    pub fn sent(&self) -> &[Frame] {
        &self.sent
    }

    /// Drain the recorded frames (e.g. to replay them into a receiver).
    pub fn take_sent(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.sent)
    }

    pub fn send_attempts(&self) -> u64 {
        self.send_attempts
    }

    pub fn receive_attempts(&self) -> u64 {
        self.receive_attempts
    }

    /// Number of [`Transport::wait_writable`] calls.
    pub fn waits(&self) -> u64 {
        self.waits
    }

    /// Scripted receive outcomes not consumed yet.
    pub fn pending_receives(&self) -> usize {
        self.receives.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, frame: &Frame) -> Result<SendStatus, TransportError> {
        self.send_attempts += 1;
        let status = match self.sends.pop_front() {
            Some(Scripted::Status(status)) => status,
            Some(Scripted::Fail(op, kind)) => {
                return Err(TransportError::io(op, io::Error::from(kind)))
            }
            None => SendStatus::Sent,
        };
        if status == SendStatus::Sent {
            self.sent.push(*frame);
        }
        Ok(status)
    }

    fn receive(&mut self, _timeout: Duration) -> Result<RecvStatus, TransportError> {
        self.receive_attempts += 1;
        match self.receives.pop_front() {
            Some(Scripted::Status(status)) => Ok(status),
            Some(Scripted::Fail(op, kind)) => Err(TransportError::io(op, io::Error::from(kind))),
            None => {
                if let Some(shutdown) = &self.shutdown_when_drained {
                    shutdown.cancel();
                }
                Ok(RecvStatus::Timeout)
            }
        }
    }

    fn wait_writable(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        self.waits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CanId;

    #[test]
    fn test_send_records_only_accepted_frames() {
        let mut transport = ScriptedTransport::new();
        transport.push_send(SendStatus::Backpressure);

        let frame = Frame::with_sequence(CanId::standard(0x10), 3);
        assert_eq!(transport.send(&frame).unwrap(), SendStatus::Backpressure);
        assert!(transport.sent().is_empty());

        assert_eq!(transport.send(&frame).unwrap(), SendStatus::Sent);
        assert_eq!(transport.sent(), &[frame]);
        assert_eq!(transport.send_attempts(), 2);
    }

    #[test]
    fn test_scripted_send_error() {
        let mut transport = ScriptedTransport::new();
        transport.push_send_error(io::ErrorKind::BrokenPipe);

        let frame = Frame::with_sequence(CanId::standard(0x10), 0);
        let err = transport.send(&frame).unwrap_err();
        assert!(err.to_string().starts_with("write"));
    }

    #[test]
    fn test_receive_drains_then_times_out() {
        let shutdown = ShutdownController::new();
        let frame = Frame::with_sequence(CanId::standard(0x10), 9);
        let mut transport =
            ScriptedTransport::with_frames([frame]).shutdown_when_drained(shutdown.clone());

        let timeout = Duration::from_secs(1);
        assert_eq!(transport.receive(timeout).unwrap(), RecvStatus::Frame(frame));
        assert!(!shutdown.is_cancelled());
        assert_eq!(transport.receive(timeout).unwrap(), RecvStatus::Timeout);
        assert!(shutdown.is_cancelled());
        assert_eq!(transport.receive_attempts(), 2);
    }
}
