//! High-level TMC5160 driver: motion control, configuration and runtime
//! register access.

use crate::communicator::Communicator;
use crate::constants::defaults;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::registers::{
    self, DrvStatusFlags, GstatFlags, RampMode, Register, chopconf, ihold_irun,
};
use crate::settings::{PresetDb, Settings};
use crate::transport::Transport;
use crate::units::{Acceleration, Amps, Factor, Microsteps, Rpm, Seconds};

/// VACTUAL is a 24-bit signed value in a 32-bit word.
const VACTUAL_SIGN_BIT: u32 = 0x80_0000;
const VACTUAL_SIGN_EXTENSION: u32 = 0xff00_0000;

/// Acceleration registers reject 0; D1 in particular must never be 0.
const ACCEL_REGISTER_MIN: u32 = 1;
const ACCEL_REGISTER_MAX: u32 = 65_535;

/// Driver for one TMC5160 over one transport.
///
/// Every operation is synchronous and blocking: it performs zero or more
/// bus transactions and returns on completion or on the first failure.
/// Composite operations short-circuit and return the failing sub-write's
/// error unchanged; nothing is rolled back.
pub struct Tmc5160<T: Transport> {
    bus: Communicator<T>,
    converter: Converter,
    settings: Settings,
}

impl<T: Transport> Tmc5160<T> {
    pub fn new(transport: T, settings: Settings) -> Self {
        let converter = Converter::new(settings.clock, settings.full_steps, settings.r_sense);
        Tmc5160 {
            bus: Communicator::new(transport),
            converter,
            settings,
        }
    }

    /// Builds a driver from a named motor preset.
    pub fn with_preset(transport: T, name: &str) -> anyhow::Result<Self> {
        let preset = PresetDb::find(name)?;
        log::debug!("using motor preset: {}", preset);
        Ok(Self::new(transport, preset.settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Access to the underlying communicator (shadow cache, raw register
    /// reads and writes).
    pub fn communicator(&self) -> &Communicator<T> {
        &self.bus
    }

    pub fn communicator_mut(&mut self) -> &mut Communicator<T> {
        &mut self.bus
    }

    // --- Motion ---

    /// Stops the motor by ramping the target velocity down to zero.
    pub fn stop(&mut self) -> Result<()> {
        self.bus.write(registers::VMAX, 0)
    }

    /// Continuously rotates the motor at `velocity`.
    ///
    /// Direction is carried by the ramp mode only: the sign selects
    /// velocity-positive or velocity-negative mode (zero counts as
    /// positive), and VMAX always receives the magnitude.
    pub fn rotate(&mut self, velocity: Rpm) -> Result<()> {
        let mode = if velocity.0 >= 0.0 {
            RampMode::VelocityPositive
        } else {
            RampMode::VelocityNegative
        };

        self.set_ramp_mode(mode)?;
        self.set_max_velocity(velocity.abs())
    }

    /// Moves to an absolute position in microsteps.
    ///
    /// The chip only latches a new XTARGET while already in positioning
    /// mode, so the order is fixed: mode, then start speed, then target.
    pub fn move_to(&mut self, target: Microsteps, max_speed: Rpm) -> Result<()> {
        log::debug!("move_to {} at {} RPM", target.0, max_speed.0);
        self.set_ramp_mode(RampMode::Positioning)?;
        self.set_start_speed(max_speed)?;
        self.bus.write(registers::XTARGET, target.0 as u32)
    }

    pub fn set_ramp_mode(&mut self, mode: RampMode) -> Result<()> {
        self.bus.write(registers::RAMPMODE, mode as u32)
    }

    /// Selects the chopper algorithm (StealthChop on or off).
    pub fn set_stealth_chop(&mut self, enabled: bool) -> Result<()> {
        self.bus.write_field(chopconf::CHM, enabled as u32)
    }

    /// Sets the global current scaling factor, 0.0 ..= 1.0.
    ///
    /// 1.0 maps to the register value 256, the chip's out-of-band "full
    /// scale" encoding (not 255). Out-of-range input clamps.
    pub fn set_global_scaling(&mut self, factor: Factor) -> Result<()> {
        let safe_factor = factor.0.clamp(0.0, 1.0);
        let register_val = (safe_factor * 256.0).round() as u32;
        self.bus.write(registers::GLOBAL_SCALER, register_val)
    }

    pub fn set_max_velocity(&mut self, max_velocity: Rpm) -> Result<()> {
        let vmax = self.converter.rpm_to_vmax(max_velocity);
        self.bus.write(registers::VMAX, vmax)
    }

    pub fn set_start_speed(&mut self, start_speed: Rpm) -> Result<()> {
        let vstart = self.converter.rpm_to_vmax(start_speed);
        self.bus.write(registers::VSTART, vstart)
    }

    /// Velocity threshold between the A1 and AMAX acceleration phases (V1).
    pub fn set_ramp_transition_velocity(&mut self, speed: Rpm) -> Result<()> {
        let v1 = self.converter.rpm_to_vmax(speed);
        self.bus.write(registers::V1, v1)
    }

    /// Velocity near standstill (VSTOP). The chip requires at least 1.
    pub fn set_stop_velocity(&mut self, speed: Rpm) -> Result<()> {
        let vstop = self.converter.rpm_to_vmax(speed).max(1);
        self.bus.write(registers::VSTOP, vstop)
    }

    /// Symmetric acceleration/deceleration ramp.
    ///
    /// Registers are written in the fixed order A1, AMAX, DMAX, D1.
    pub fn set_linear_acceleration(
        &mut self,
        acceleration: Acceleration,
        deceleration: Acceleration,
    ) -> Result<()> {
        let a_val = self.converter.accel_to_register(acceleration);
        let d_val = self
            .converter
            .accel_to_register(deceleration)
            .clamp(ACCEL_REGISTER_MIN, ACCEL_REGISTER_MAX);

        self.bus.write(registers::A1, a_val)?;
        self.bus.write(registers::AMAX, a_val)?;
        self.bus.write(registers::DMAX, d_val)?;
        self.bus.write(registers::D1, d_val)
    }

    /// Four-phase ramp with independent acceleration values.
    ///
    /// Same fixed register order as the linear variant: A1, AMAX, DMAX, D1.
    pub fn set_advanced_acceleration(
        &mut self,
        start_accel: Acceleration,
        max_accel: Acceleration,
        max_decel: Acceleration,
        stop_decel: Acceleration,
    ) -> Result<()> {
        let d1_val = self
            .converter
            .accel_to_register(stop_decel)
            .clamp(ACCEL_REGISTER_MIN, ACCEL_REGISTER_MAX);

        let a1_val = self.converter.accel_to_register(start_accel);
        self.bus.write(registers::A1, a1_val)?;

        let amax_val = self.converter.accel_to_register(max_accel);
        self.bus.write(registers::AMAX, amax_val)?;

        let dmax_val = self.converter.accel_to_register(max_decel);
        self.bus.write(registers::DMAX, dmax_val)?;

        self.bus.write(registers::D1, d1_val)
    }

    /// Sets AMAX only.
    pub fn set_acceleration(&mut self, acceleration: Acceleration) -> Result<()> {
        let amax = self.converter.accel_to_register(acceleration);
        self.bus.write(registers::AMAX, amax)
    }

    /// Wait time at standstill before a direction change (TZEROWAIT).
    pub fn set_standstill_wait(&mut self, duration: Seconds) -> Result<()> {
        let tzerowait = self.converter.duration_to_tzerowait(duration);
        self.bus.write(registers::TZEROWAIT, tzerowait)
    }

    /// Overwrites the current position (XACTUAL).
    ///
    /// Only do this while homing: in positioning mode the write starts a
    /// motion towards XTARGET.
    pub fn set_actual_motor_position(&mut self, position: Microsteps) -> Result<()> {
        self.bus.write(registers::XACTUAL, position.0 as u32)
    }

    /// Sets the run current (IRUN field).
    pub fn set_irun(&mut self, current: Amps) -> Result<()> {
        let cs = self.converter.current_to_cs(current);
        self.bus.write_field(ihold_irun::IRUN, cs as u32)
    }

    /// Sets the standstill current (IHOLD field) together with the default
    /// hold delay.
    pub fn set_ihold(&mut self, current: Amps) -> Result<()> {
        let cs = self.converter.current_to_cs(current);
        self.bus.write_field(ihold_irun::IHOLD, cs as u32)?;
        self.bus.write_field(ihold_irun::IHOLD_DELAY, defaults::HOLD_DELAY)
    }

    /// Current motor position, signed microsteps.
    pub fn get_actual_motor_position(&mut self) -> Result<Microsteps> {
        let raw = self.bus.read(registers::XACTUAL)?;
        Ok(Microsteps(raw as i32))
    }

    /// Current absolute motor velocity in RPM.
    ///
    /// VACTUAL is 24-bit signed; the value is sign-extended before the
    /// magnitude is converted.
    pub fn get_actual_velocity(&mut self) -> Result<Rpm> {
        let raw = self.bus.read(registers::VACTUAL)?;

        let signed = if raw & VACTUAL_SIGN_BIT != 0 {
            (raw | VACTUAL_SIGN_EXTENSION) as i32
        } else {
            raw as i32
        };

        Ok(self.converter.vmax_to_rpm(signed.unsigned_abs()))
    }

    // --- Configuration ---

    /// Applies a safe hardcoded configuration that gets a typical motor
    /// turning on an EVAL board.
    pub fn apply_default_configuration(&mut self) -> Result<()> {
        self.bus.write(registers::VSTOP, 100)?;
        self.bus.write(registers::V1, 40_000)?;
        self.bus.write(registers::AMAX, 10_000)?;
        self.bus.write(registers::DMAX, 10_000)?;
        self.bus.write(registers::A1, 2_000)?;
        self.bus.write(registers::D1, 10_000)?;
        self.bus.write(registers::TPOWERDOWN, 10)?;

        self.bus.write_field(ihold_irun::IHOLD_DELAY, defaults::HOLD_DELAY)?;
        self.bus.write_field(ihold_irun::IHOLD, 4)?;
        self.bus.write_field(ihold_irun::IRUN, 16)?;

        self.bus.write_field(chopconf::TOFF, 3)?;
        self.bus.write_field(chopconf::HSTRT, 4)?;
        self.bus.write_field(chopconf::HEND, 1)?;
        self.bus.write_field(chopconf::TBL, 2)?;

        self.bus.write(registers::XTARGET, 0)?;
        self.set_ramp_mode(RampMode::Positioning)?;

        log::info!("default configuration applied");
        Ok(())
    }

    /// Applies the full [`Settings`] aggregate.
    ///
    /// Fails fast: the first failing write aborts the sequence and its
    /// error is returned unchanged. The chip is then partially configured;
    /// re-running this method is the recovery path.
    pub fn apply_settings(&mut self) -> Result<()> {
        let settings = self.settings.clone();

        self.set_ramp_mode(RampMode::Positioning)?;

        self.set_start_speed(settings.v_start)?;
        self.set_stop_velocity(settings.v_stop)?;
        self.set_ramp_transition_velocity(settings.v1)?;
        self.set_max_velocity(settings.v_max)?;

        self.set_advanced_acceleration(settings.a1, settings.a_max, settings.d_max, settings.d1)?;

        let run_cs = self.converter.current_to_cs(settings.run_current);
        let hold_cs = self.converter.current_to_cs(settings.hold_current);
        self.bus.write_field(ihold_irun::IRUN, run_cs as u32)?;
        self.bus.write_field(ihold_irun::IHOLD, hold_cs as u32)?;
        self.bus.write_field(ihold_irun::IHOLD_DELAY, settings.hold_delay as u32)?;

        self.bus.write(registers::TPOWERDOWN, settings.power_down_delay as u32)?;

        self.bus.write_field(chopconf::TOFF, settings.toff as u32)?;
        self.bus.write_field(chopconf::HSTRT, settings.hstrt as u32)?;
        self.bus.write_field(chopconf::HEND, settings.hend as u32)?;
        self.bus.write_field(chopconf::TBL, settings.tbl as u32)?;

        self.set_stealth_chop(settings.stealth_chop)?;

        self.bus.write(registers::XTARGET, 0)?;
        self.bus.write(registers::XACTUAL, 0)?;

        log::info!("motor settings applied");
        Ok(())
    }

    // --- Runtime register access ---

    /// Reads a register by runtime address via the registry.
    pub fn read_register(&mut self, address: u8) -> Result<u32> {
        let reg = registers::lookup(address).ok_or(Error::InvalidParameter)?;
        self.bus.read(reg)
    }

    /// Writes a register by runtime address via the registry.
    ///
    /// Unknown addresses are `InvalidParameter`; writes to read-only
    /// registers are `RegisterAccess`.
    pub fn write_register(&mut self, address: u8, value: u32) -> Result<()> {
        let reg = registers::lookup(address).ok_or(Error::InvalidParameter)?;
        if !reg.is_writable() {
            return Err(Error::RegisterAccess);
        }
        self.bus.write(reg, value)
    }

    /// Reads every register in the registry, in address order. The first
    /// failing read aborts the dump.
    pub fn dump_registers(&mut self) -> Result<Vec<(Register, u32)>> {
        let mut values = Vec::with_capacity(registers::REGISTRY.len());
        for reg in registers::REGISTRY {
            let value = self.bus.read(reg)?;
            log::debug!("{}: 0x{:08x}", reg, value);
            values.push((reg, value));
        }
        Ok(values)
    }

    /// Global status flags, decoded.
    pub fn get_gstat(&mut self) -> Result<GstatFlags> {
        Ok(GstatFlags(self.bus.read(registers::GSTAT)?))
    }

    /// Driver status flags (StallGuard, temperature, shorts), decoded.
    pub fn get_drv_status(&mut self) -> Result<DrvStatusFlags> {
        Ok(DrvStatusFlags(self.bus.read(registers::DRV_STATUS)?))
    }
}
