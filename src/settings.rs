//! Motor configuration aggregate and the named preset database.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::units::{Acceleration, Amps, Hertz, Microsteps, Ohms, Rpm};

/// One complete motor configuration.
///
/// Velocities and currents are physical quantities; `toff`/`hstrt`/`hend`/
/// `tbl` are raw chopper encodings as the datasheet defines them. Applied
/// in one shot via [`Tmc5160::apply_settings`](crate::Tmc5160::apply_settings).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chip clock frequency.
    pub clock: Hertz,
    /// Sense resistor value. Must match the board.
    pub r_sense: Ohms,
    /// Motor full steps per revolution.
    pub full_steps: Microsteps,

    pub run_current: Amps,
    pub hold_current: Amps,
    /// IHOLDDELAY encoding, 0..=15.
    pub hold_delay: u8,
    /// TPOWERDOWN encoding, 0..=255.
    pub power_down_delay: u8,

    pub v_start: Rpm,
    pub v_stop: Rpm,
    /// Threshold between the A1 and AMAX acceleration phases.
    pub v1: Rpm,
    pub v_max: Rpm,

    pub a1: Acceleration,
    pub a_max: Acceleration,
    pub d_max: Acceleration,
    pub d1: Acceleration,

    pub stealth_chop: bool,

    // Chopper timing, raw datasheet encodings.
    pub toff: u8,
    pub hstrt: u8,
    pub hend: u8,
    pub tbl: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            clock: Hertz(defaults::CLOCK_HZ),
            r_sense: Ohms(defaults::R_SENSE_OHMS),
            full_steps: Microsteps(defaults::FULL_STEPS),
            run_current: Amps(0.0),
            hold_current: Amps(0.0),
            hold_delay: defaults::HOLD_DELAY as u8,
            power_down_delay: 10,
            v_start: Rpm(0.0),
            v_stop: Rpm(0.0),
            v1: Rpm(0.0),
            v_max: Rpm(0.0),
            a1: Acceleration(0.0),
            a_max: Acceleration(0.0),
            d_max: Acceleration(0.0),
            d1: Acceleration(0.0),
            stealth_chop: false,
            toff: 3,
            hstrt: 4,
            hend: 1,
            tbl: 2,
        }
    }
}

/// A named, ready-to-use motor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub settings: Settings,
}

impl ::std::fmt::Display for Preset {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

/// Database of motor presets shipped with the crate.
pub struct PresetDb {
    presets: Vec<Preset>,
}

impl PresetDb {
    pub fn load() -> Result<Self> {
        Ok(PresetDb {
            presets: vec![
                serde_yaml::from_str(include_str!("../motors/generic-nema17.yaml"))?,
                serde_yaml::from_str(include_str!("../motors/nema23-high-torque.yaml"))?,
                serde_yaml::from_str(include_str!("../motors/pancake-nema14.yaml"))?,
            ],
        })
    }

    pub fn find(name: &str) -> Result<Preset> {
        let db = PresetDb::load()?;

        db.presets
            .iter()
            .find(|preset| preset.name == name)
            .cloned()
            .ok_or_else(|| anyhow::format_err!("No motor preset named {:?}", name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|preset| preset.name.as_str()).collect()
    }
}
