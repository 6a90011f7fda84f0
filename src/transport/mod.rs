//! Abstract bus transport interface.
use std::time::Duration;

use crate::constants::FRAME_SIZE;

pub use self::mock::MockTransport;

mod mock;

/// Abstraction of the transport layer.
/// Might be a memory-mapped SPI peripheral, a spidev handle, or a test
/// double. This trait is the only boundary the driver core depends on.
pub trait Transport {
    /// Performs one full-duplex 5-byte exchange.
    ///
    /// Returns `false` on failure (including timeout); the contents of `rx`
    /// are unspecified in that case.
    fn transfer(&mut self, tx: &[u8; FRAME_SIZE], rx: &mut [u8; FRAME_SIZE], timeout: Duration)
    -> bool;

    /// Asserts chip select.
    fn select(&mut self);

    /// Releases chip select.
    fn deselect(&mut self);
}
