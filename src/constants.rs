
/// Length of one SPI datagram: address byte + 32-bit payload.
pub const FRAME_SIZE: usize = 5;

/// Size of the register address space (7-bit addresses).
pub const REGISTER_COUNT: usize = 128;

/// Per-transfer timeout handed to the transport. The core never retries;
/// a timed-out transfer surfaces as an ordinary transfer failure.
pub const TRANSFER_TIMEOUT_MS: u64 = 10;

pub mod wire {
    /// Set in the address byte to mark a write datagram.
    pub const WRITE_FLAG: u8 = 0x80;
    /// Mask selecting the 7-bit register address.
    pub const ADDRESS_MASK: u8 = 0x7f;
}

pub mod defaults {
    /// Internal oscillator / typical crystal frequency in Hz.
    ///
    /// Most TMC5160 modules run a 12 MHz clock (datasheet section 26).
    pub const CLOCK_HZ: f32 = 12_000_000.0;

    /// Full steps per revolution of a standard 1.8 degree motor.
    pub const FULL_STEPS: i32 = 200;

    /// Sense resistor of the TMC5160-EVAL board, in Ohms.
    ///
    /// Must match the hardware resistor or current limits will be off.
    pub const R_SENSE_OHMS: f32 = 0.075;

    /// IHOLDDELAY value written alongside the hold current.
    pub const HOLD_DELAY: u32 = 6;
}
