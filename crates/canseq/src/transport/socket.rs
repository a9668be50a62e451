// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SocketCAN raw socket transport (Linux).
//!
//! The socket is bound to one interface. A sending probe installs a
//! drop-all filter so its receive queue never fills; a receiving probe
//! installs a single id/mask filter for the probe identifier.

use super::{RecvStatus, SendStatus, Transport};
use crate::config::{Role, RunConfig};
use crate::error::TransportError;
use crate::frame::{CanId, Filter, Frame};
use socketcan::{
    CanFilter, CanFrame, CanSocket, EmbeddedFrame, ExtendedId, Id, Socket, SocketOptions,
    StandardId,
};
use std::io;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Raw CAN socket bound to a single interface.
pub struct SocketCanTransport {
    socket: CanSocket,
    interface: String,
    read_timeout: Option<Duration>,
}

impl SocketCanTransport {
    /// Open a socket on `config.interface` with the filter its role needs.
    pub fn open(config: &RunConfig) -> Result<Self, TransportError> {
        let socket =
            CanSocket::open(&config.interface).map_err(|e| TransportError::io("open", e))?;

        let filtered = match config.role {
            Role::Send => socket.set_filter_drop_all(),
            Role::Receive => {
                let Filter { id, mask } = config.filter();
                socket.set_filters(&[CanFilter::new(id, mask)])
            }
        };
        filtered.map_err(|e| TransportError::io("filter", e))?;

        tracing::debug!(
            interface = %config.interface,
            role = ?config.role,
            filter = ?config.filter(),
            "SocketCAN socket bound"
        );

        Ok(Self {
            socket,
            interface: config.interface.clone(),
            read_timeout: None,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn to_can_frame(frame: &Frame) -> Option<CanFrame> {
        let id: Id = if frame.id.is_extended() {
            ExtendedId::new(frame.id.raw())?.into()
        } else {
            StandardId::new(u16::try_from(frame.id.raw()).ok()?)?.into()
        };
        CanFrame::new(id, &frame.payload)
    }

    fn from_can_frame(frame: &CanFrame) -> Option<Frame> {
        let id = match frame.id() {
            Id::Standard(id) => CanId::standard(u32::from(id.as_raw())),
            Id::Extended(id) => CanId::extended(id.as_raw()),
        };
        Frame::from_data(id, frame.data())
    }
}

impl Transport for SocketCanTransport {
    fn send(&mut self, frame: &Frame) -> Result<SendStatus, TransportError> {
        let can_frame = Self::to_can_frame(frame).ok_or_else(|| {
            TransportError::io(
                "write",
                io::Error::new(io::ErrorKind::InvalidInput, "identifier out of range"),
            )
        })?;

        match self.socket.write_frame(&can_frame) {
            Ok(()) => Ok(SendStatus::Sent),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(SendStatus::Interrupted),
            Err(e) if e.raw_os_error() == Some(libc::ENOBUFS) => Ok(SendStatus::Backpressure),
            Err(e) => Err(TransportError::io("write", e)),
        }
    }

    fn receive(&mut self, timeout: Duration) -> Result<RecvStatus, TransportError> {
        if self.read_timeout != Some(timeout) {
            self.socket
                .set_read_timeout(Some(timeout))
                .map_err(|e| TransportError::io("set read timeout", e))?;
            self.read_timeout = Some(timeout);
        }

        match self.socket.read_frame() {
            Ok(can_frame) => match Self::from_can_frame(&can_frame) {
                Some(frame) => Ok(RecvStatus::Frame(frame)),
                None => {
                    tracing::trace!("Ignoring oversized frame (dlc {})", can_frame.dlc());
                    Ok(RecvStatus::Timeout)
                }
            },
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Ok(RecvStatus::Timeout),
                io::ErrorKind::Interrupted => Ok(RecvStatus::Interrupted),
                _ => Err(TransportError::io("read", e)),
            },
        }
    }

    fn wait_writable(&mut self, timeout: Duration) -> Result<(), TransportError> {
        let mut fds = [libc::pollfd {
            fd: self.socket.as_raw_fd(),
            events: libc::POLLOUT,
            revents: 0,
        }];
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `fds` is a live array of exactly one pollfd for the whole call.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), 1, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(TransportError::io("poll", err));
            }
        }
        Ok(())
    }
}
