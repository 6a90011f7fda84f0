//! Core communication layer: datagram sequencing and the shadow register
//! cache.

use std::time::Duration;

use crate::constants::{FRAME_SIZE, REGISTER_COUNT, TRANSFER_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::protocol::{Frame, Reply};
use crate::registers::{Access, Field, Register};
use crate::transport::Transport;

/// Low-level communicator for a single TMC5160.
///
/// Owns the transport and a shadow copy of the register file. The shadow is
/// updated on every write *before* the bus transaction, which lets
/// [`write_field`](Communicator::write_field) do read-modify-write without
/// any bus read. The flip side: after a failed write, or after an external
/// chip reset, the shadow reflects intended rather than actual chip state.
/// That trade-off is intentional and not corrected here; recovery is the
/// caller's job (e.g. by re-applying the full configuration).
pub struct Communicator<T: Transport> {
    transport: T,
    shadow: [u32; REGISTER_COUNT],
}

impl<T: Transport> Communicator<T> {
    pub fn new(transport: T) -> Self {
        Communicator {
            transport,
            shadow: [0; REGISTER_COUNT],
        }
    }

    /// Writes a 32-bit value to a writable register.
    ///
    /// The shadow entry is updated first, then one select/transfer/deselect
    /// bracket runs on the bus.
    pub fn write(&mut self, reg: Register, value: u32) -> Result<()> {
        if !reg.is_writable() {
            return Err(Error::InvalidParameter);
        }

        self.shadow[reg.address as usize] = value;
        self.write_raw(reg.address, value)
    }

    /// Writes a field within a register, preserving the other bits.
    ///
    /// The current register value comes from the shadow, not from hardware,
    /// so this costs a single write datagram.
    pub fn write_field(&mut self, field: Field, value: u32) -> Result<()> {
        let current = self.shadow[field.register.address as usize];
        self.write(field.register, field.compose(current, value))
    }

    /// Reads a register value.
    ///
    /// Volatile and read-only registers always go to hardware; everything
    /// else is served from the shadow with zero bus traffic.
    pub fn read(&mut self, reg: Register) -> Result<u32> {
        if reg.volatile || reg.access == Access::ReadOnly {
            self.read_raw(reg.address)
        } else {
            Ok(self.shadow[reg.address as usize])
        }
    }

    /// Reads a register and extracts one field from it.
    pub fn read_field(&mut self, field: Field) -> Result<u32> {
        Ok(field.extract(self.read(field.register)?))
    }

    /// Shadow entry for `address`, without touching the bus.
    pub fn get_shadow(&self, address: u8) -> Result<u32> {
        self.shadow
            .get(address as usize)
            .copied()
            .ok_or(Error::RegisterAccess)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn write_raw(&mut self, address: u8, value: u32) -> Result<()> {
        let tx = Frame::Write { address, value }.into_raw()?;
        self.transfer(&tx)?;
        Ok(())
    }

    /// Two-transaction pipelined read (datasheet section 4.1): the first
    /// datagram names the address, the reply to the second one carries the
    /// value.
    fn read_raw(&mut self, address: u8) -> Result<u32> {
        let request = Frame::ReadRequest { address }.into_raw()?;
        self.transfer(&request)?;

        let rx = self.transfer(&Frame::Dummy.into_raw()?)?;
        let reply = Reply::from_raw(&rx)?;
        log::trace!("spi status {:?}", reply.status);

        Ok(reply.value)
    }

    /// One select/transfer/deselect bracket.
    fn transfer(&mut self, tx: &[u8; FRAME_SIZE]) -> Result<[u8; FRAME_SIZE]> {
        let mut rx = [0u8; FRAME_SIZE];
        log::debug!("=> {}", hex::encode(tx));

        let ok = SelectGuard::new(&mut self.transport).transfer(
            tx,
            &mut rx,
            Duration::from_millis(TRANSFER_TIMEOUT_MS),
        );
        if !ok {
            return Err(Error::TransferFailed);
        }

        log::debug!("<= {}", hex::encode(rx));
        Ok(rx)
    }
}

/// Asserts chip select on construction and releases it on drop, so deselect
/// runs on every exit path, error or not.
struct SelectGuard<'a, T: Transport> {
    transport: &'a mut T,
}

impl<'a, T: Transport> SelectGuard<'a, T> {
    fn new(transport: &'a mut T) -> Self {
        transport.select();
        SelectGuard { transport }
    }

    fn transfer(
        self,
        tx: &[u8; FRAME_SIZE],
        rx: &mut [u8; FRAME_SIZE],
        timeout: Duration,
    ) -> bool {
        self.transport.transfer(tx, rx, timeout)
    }
}

impl<T: Transport> Drop for SelectGuard<'_, T> {
    fn drop(&mut self) {
        self.transport.deselect();
    }
}
