//! Unit-tagged quantities used at the driver API boundary.
//!
//! Each physical quantity gets its own newtype so that an RPM can never be
//! handed to an API expecting Amperes. There are no implicit conversions
//! between units; only the [`Converter`](crate::converter::Converter) maps
//! quantities to register encodings.

use serde::{Deserialize, Serialize};

/// Rotational velocity in revolutions per minute. Sign encodes direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rpm(pub f32);

/// RMS motor current in Amperes.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amps(pub f32);

/// Position or step count in microsteps (signed, two's complement on wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Microsteps(pub i32);

/// Frequency in Hertz.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Hertz(pub f32);

/// Resistance in Ohms.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Ohms(pub f32);

/// Time duration in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Seconds(pub f32);

/// Acceleration in microsteps per second squared.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Acceleration(pub f32);

/// Dimensionless scaling factor, nominally 0.0 ..= 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Factor(pub f32);

impl Rpm {
    pub fn abs(self) -> Rpm {
        Rpm(self.0.abs())
    }
}

impl std::ops::Neg for Rpm {
    type Output = Rpm;

    fn neg(self) -> Rpm {
        Rpm(-self.0)
    }
}

impl Hertz {
    pub const fn megahertz(mhz: f32) -> Hertz {
        Hertz(mhz * 1_000_000.0)
    }
}

impl Ohms {
    pub const fn milliohms(mohm: f32) -> Ohms {
        Ohms(mohm / 1000.0)
    }
}

impl Amps {
    pub const fn milliamps(ma: f32) -> Amps {
        Amps(ma / 1000.0)
    }
}

impl Seconds {
    pub const fn millis(ms: f32) -> Seconds {
        Seconds(ms / 1000.0)
    }
}
