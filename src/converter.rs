//! Conversions between physical quantities and register encodings.

use crate::units::{Acceleration, Amps, Hertz, Microsteps, Ohms, Rpm, Seconds};

/// Converts physical units (RPM, Amperes, seconds, steps/s²) into the
/// fixed-point encodings of the TMC5160 registers.
///
/// All conversions are pure functions of the three hardware parameters, so
/// a fixed configuration can be validated ahead of time, with no chip
/// attached.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    clock_hz: f32,
    full_steps: f32,
    r_sense: f32,
}

impl Converter {
    /// `clock` is the chip clock (typically 12 MHz), `full_steps` the motor
    /// full steps per revolution (typically 200), `r_sense` the sense
    /// resistor value.
    pub const fn new(clock: Hertz, full_steps: Microsteps, r_sense: Ohms) -> Self {
        Converter {
            clock_hz: clock.0,
            full_steps: full_steps.0 as f32,
            r_sense: r_sense.0,
        }
    }

    /// RPM to the VMAX velocity encoding: `v[Hz] * 2^24 / f_clk`, where
    /// `v[Hz]` counts microsteps at 256 per full step.
    ///
    /// No upper clamp is applied here; whether the hardware-facing limit
    /// (VMAX is 23 bits) should be enforced at this level is an open point,
    /// so the raw truncation is kept.
    pub fn rpm_to_vmax(&self, rpm: Rpm) -> u32 {
        let v_hz = (rpm.0 as f64 * self.full_steps as f64 * 256.0) / 60.0;
        let multiplier = (1u64 << 24) as f64;

        ((v_hz * multiplier) / self.clock_hz as f64) as u32
    }

    /// Inverse of [`rpm_to_vmax`](Converter::rpm_to_vmax). Floating-point
    /// arithmetic both ways, so round trips are close but not exact.
    pub fn vmax_to_rpm(&self, vmax: u32) -> Rpm {
        let scale = (1u64 << 24) as f32;
        let v_hz = (vmax as f32 * self.clock_hz) / scale;

        Rpm((v_hz * 60.0) / (self.full_steps * 256.0))
    }

    /// RMS current to the 5-bit CS (current scale) encoding.
    ///
    /// Full scale is `(0.325 V / r_sense) / sqrt(2)` RMS. Zero or negative
    /// current yields 0, anything at or above full scale yields 31.
    pub fn current_to_cs(&self, current: Amps) -> u8 {
        const V_FS: f32 = 0.325;

        let full_scale_rms = (V_FS / self.r_sense) / std::f32::consts::SQRT_2;
        let ratio = current.0 / full_scale_rms;

        (((ratio * 32.0) - 1.0) as i32).clamp(0, 31) as u8
    }

    /// Acceleration to the AMAX/DMAX/A1/D1 encoding:
    /// `a * 2^41 / f_clk²`, clamped to 1..=65535.
    ///
    /// Zero acceleration maps to 1, the minimum the chip can encode.
    pub fn accel_to_register(&self, accel: Acceleration) -> u32 {
        let factor = (1u64 << 41) as f32;
        let result = (accel.0 * factor) / (self.clock_hz * self.clock_hz);

        result.clamp(1.0, 65_535.0) as u32
    }

    /// Standstill wait time to the TZEROWAIT encoding:
    /// `t * f_clk / 2^9`, clamped to 0..=65535.
    pub fn duration_to_tzerowait(&self, duration: Seconds) -> u32 {
        let clocks = duration.0 * self.clock_hz;
        let reg_val = clocks / (1u64 << 9) as f32;

        reg_val.clamp(0.0, 65_535.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Hertz, Microsteps, Ohms};

    fn converter() -> Converter {
        Converter::new(Hertz::megahertz(12.0), Microsteps(200), Ohms::milliohms(75.0))
    }

    #[test]
    fn rpm_to_vmax_zero_maps_to_zero() {
        assert_eq!(converter().rpm_to_vmax(Rpm(0.0)), 0);
    }

    #[test]
    fn rpm_to_vmax_one_rev_per_second() {
        // 60 RPM = 51200 usteps/s -> 51200 * 2^24 / 12 MHz
        let vmax = converter().rpm_to_vmax(Rpm(60.0));
        assert!(vmax > 70_000 && vmax < 75_000, "vmax = {vmax}");
    }

    #[test]
    fn rpm_to_vmax_is_monotonic() {
        let c = converter();
        let slow = c.rpm_to_vmax(Rpm(10.0));
        let medium = c.rpm_to_vmax(Rpm(100.0));
        let fast = c.rpm_to_vmax(Rpm(1000.0));
        assert!(slow < medium && medium < fast);
    }

    #[test]
    fn vmax_to_rpm_zero_maps_to_zero() {
        assert_eq!(converter().vmax_to_rpm(0).0, 0.0);
    }

    #[test]
    fn rpm_round_trip_stays_within_one_rpm() {
        let c = converter();
        for rpm in [10.0f32, 100.0, 1000.0] {
            let back = c.vmax_to_rpm(c.rpm_to_vmax(Rpm(rpm)));
            assert!((back.0 - rpm).abs() < 1.0, "{rpm} RPM came back as {}", back.0);
        }
    }

    #[test]
    fn current_to_cs_zero_and_negative_clamp_to_zero() {
        let c = converter();
        assert_eq!(c.current_to_cs(Amps(0.0)), 0);
        assert_eq!(c.current_to_cs(Amps(-1.0)), 0);
    }

    #[test]
    fn current_to_cs_full_scale_clamps_to_31() {
        // full scale at 75 mOhm is ~3.06 A RMS
        let c = converter();
        assert_eq!(c.current_to_cs(Amps(3.1)), 31);
        assert_eq!(c.current_to_cs(Amps(10.0)), 31);
    }

    #[test]
    fn current_to_cs_mid_range() {
        let cs = converter().current_to_cs(Amps(1.5));
        assert!((10..=20).contains(&cs), "cs = {cs}");
    }

    #[test]
    fn current_to_cs_is_monotonic() {
        let c = converter();
        let low = c.current_to_cs(Amps(0.5));
        let mid = c.current_to_cs(Amps(1.0));
        let high = c.current_to_cs(Amps(2.0));
        assert!(low <= mid && mid <= high);
    }

    #[test]
    fn accel_zero_maps_to_minimum_encodable() {
        assert_eq!(converter().accel_to_register(Acceleration(0.0)), 1);
    }

    #[test]
    fn accel_clamps_to_u16_max() {
        assert_eq!(converter().accel_to_register(Acceleration(1e10)), 65_535);
    }

    #[test]
    fn accel_is_monotonic_in_range() {
        let c = converter();
        let slow = c.accel_to_register(Acceleration(10_000.0));
        let fast = c.accel_to_register(Acceleration(100_000.0));
        assert!(slow < fast);
        assert!(fast <= 65_535);
    }

    #[test]
    fn tzerowait_zero_maps_to_zero() {
        assert_eq!(converter().duration_to_tzerowait(Seconds(0.0)), 0);
    }

    #[test]
    fn tzerowait_clamps_to_u16_max() {
        assert_eq!(converter().duration_to_tzerowait(Seconds(1000.0)), 65_535);
    }

    #[test]
    fn tzerowait_is_monotonic() {
        let c = converter();
        let short = c.duration_to_tzerowait(Seconds::millis(10.0));
        let long = c.duration_to_tzerowait(Seconds::millis(100.0));
        assert!(short < long);
        assert!(long > 0);
    }

    #[test]
    fn conversions_scale_with_clock() {
        for clock in [8.0f32, 12.0, 16.0] {
            let c = Converter::new(Hertz::megahertz(clock), Microsteps(200), Ohms::milliohms(75.0));
            assert!(c.rpm_to_vmax(Rpm(100.0)) > 0);
        }
    }
}
