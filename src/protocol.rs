//! The underlying 40-bit SPI datagram protocol of the TMC5160.
//!
//! Every exchange is exactly five bytes: an address byte (bit 7 set for
//! writes) followed by a 32-bit big-endian payload. Register reads are
//! pipelined: the first datagram only names the address, and the reply to
//! the *next* datagram carries the value.

use scroll::{Pread, Pwrite};

use crate::constants::{FRAME_SIZE, wire};
use crate::error::Result;
use crate::registers::SpiStatus;

/// One outgoing datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Write `value` to the register at `address`.
    Write { address: u8, value: u32 },
    /// First half of a read: request the register at `address`.
    ReadRequest { address: u8 },
    /// Second half of a read: all-zero datagram clocking out the value
    /// requested by the previous frame.
    Dummy,
}

impl Frame {
    pub fn into_raw(self) -> Result<[u8; FRAME_SIZE]> {
        let mut buf = [0u8; FRAME_SIZE];
        match self {
            Frame::Write { address, value } => {
                buf[0] = (address & wire::ADDRESS_MASK) | wire::WRITE_FLAG;
                buf.pwrite_with(value, 1, scroll::BE)?;
            }
            Frame::ReadRequest { address } => {
                buf[0] = address & wire::ADDRESS_MASK;
            }
            Frame::Dummy => {}
        }
        Ok(buf)
    }
}

/// A decoded reply datagram.
///
/// The payload belongs to the register requested one transaction earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Status flags the chip shifts out with every reply.
    pub status: SpiStatus,
    pub value: u32,
}

impl Reply {
    pub fn from_raw(raw: &[u8; FRAME_SIZE]) -> Result<Self> {
        let value = raw.pread_with::<u32>(1, scroll::BE)?;
        Ok(Reply {
            status: SpiStatus(raw[0]),
            value,
        })
    }
}
