//! TMC5160 stepper motor controller driver.
//!
//! Transport-agnostic: anything implementing [`Transport`] (a 5-byte
//! full-duplex exchange plus chip select) can carry the driver. Register
//! writes go through a shadow cache so bit-field updates never need a bus
//! read; see [`communicator::Communicator`] for the trade-offs.

pub mod communicator;
pub mod constants;
pub mod converter;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod registers;
pub mod settings;
pub mod transport;
pub mod units;

pub use self::communicator::Communicator;
pub use self::converter::Converter;
pub use self::driver::Tmc5160;
pub use self::error::{Error, Result};
pub use self::registers::RampMode;
pub use self::settings::{Preset, PresetDb, Settings};
pub use self::transport::Transport;
