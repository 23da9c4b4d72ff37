//! Panel configuration parameters
//!
//! All tunable parameters for the display engine: bus topology, settle
//! timings, interpolation speeds, and guidance thresholds.  Values can be
//! overridden from a JSON file at startup.

use serde::{Deserialize, Serialize};

/// Core panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    // --- Bus topology ---
    /// I2C address of channel expander chip A (displays 1–7 + control link)
    pub mux_a_addr: u8,
    /// I2C address of channel expander chip B (displays 8–9 + visualizer)
    pub mux_b_addr: u8,
    /// I2C address every display controller answers at
    pub display_addr: u8,

    // --- Settle timings ---
    /// Pause after any channel-select write (milliseconds)
    pub channel_settle_ms: u32,
    /// Pause when a selection crosses from one chip to the other
    /// (milliseconds).  Both chips are assumed to share one electrical wire
    /// pair; if the buses are ever confirmed separate this can be set to 0.
    pub chip_switch_settle_ms: u32,
    /// Pause after a frame push, before the next command on the same channel
    /// (milliseconds)
    pub push_settle_ms: u32,

    // --- Startup probe ---
    /// Per-slot probe budget during init (milliseconds)
    pub probe_timeout_ms: u32,
    /// Interval between probe attempts (milliseconds)
    pub probe_retry_ms: u32,

    // --- Interpolation speeds (display units per second) ---
    /// Pressurizer pressure (bar/s; full 0–200 bar sweep ≈ 2 s)
    pub pressure_speed: f32,
    /// Rod position (%/s; full 0–100 % sweep ≈ 2 s)
    pub rod_speed: f32,
    /// Thermal power (kW/s; full 0–100 MW sweep ≈ 2 s)
    pub power_speed: f32,

    // --- Guidance thresholds ---
    /// Pressure required before pump startup guidance begins (bar)
    pub pump_start_pressure: f32,
    /// Operating pressure target (bar)
    pub operating_pressure: f32,
    /// Rated thermal power (kW)
    pub rated_power_kw: f32,
    /// Fraction of rated power above which the plant counts as at rest
    pub full_power_fraction: f32,
    /// Fraction of rated power at which the "still rising" phrasing flips
    /// to "full power"
    pub power_risen_fraction: f32,
    /// Idle prompt blink period (seconds)
    pub idle_blink_secs: f32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            // Bus topology
            mux_a_addr: 0x70,
            mux_b_addr: 0x71,
            display_addr: 0x3C,

            // Settle timings
            channel_settle_ms: 5,
            chip_switch_settle_ms: 25,
            push_settle_ms: 10,

            // Startup probe
            probe_timeout_ms: 200,
            probe_retry_ms: 20,

            // Interpolation speeds
            pressure_speed: 100.0,
            rod_speed: 50.0,
            power_speed: 50_000.0,

            // Guidance thresholds
            pump_start_pressure: 45.0,
            operating_pressure: 140.0,
            rated_power_kw: 100_000.0,
            full_power_fraction: 0.997,
            power_risen_fraction: 0.95,
            idle_blink_secs: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = PanelConfig::default();
        assert!(c.mux_a_addr != c.mux_b_addr);
        assert!(c.chip_switch_settle_ms > c.channel_settle_ms);
        assert!(c.probe_retry_ms < c.probe_timeout_ms);
        assert!(c.pressure_speed > 0.0 && c.rod_speed > 0.0 && c.power_speed > 0.0);
        assert!(c.pump_start_pressure < c.operating_pressure);
        assert!(c.idle_blink_secs > 0.0);
    }

    #[test]
    fn phrasing_threshold_below_rest_threshold() {
        let c = PanelConfig::default();
        assert!(
            c.power_risen_fraction < c.full_power_fraction,
            "full-power phrasing must appear before the at-rest threshold"
        );
    }

    #[test]
    fn sweep_times_land_between_one_and_three_seconds() {
        let c = PanelConfig::default();
        for (range, speed) in [
            (200.0, c.pressure_speed),
            (100.0, c.rod_speed),
            (c.rated_power_kw, c.power_speed),
        ] {
            let sweep = range / speed;
            assert!((1.0..=3.0).contains(&sweep), "sweep {sweep}s out of band");
        }
    }

    #[test]
    fn serde_roundtrip() {
        let c = PanelConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: PanelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.mux_a_addr, c2.mux_a_addr);
        assert_eq!(c.chip_switch_settle_ms, c2.chip_switch_settle_ms);
        assert!((c.pressure_speed - c2.pressure_speed).abs() < 0.001);
        assert!((c.rated_power_kw - c2.rated_power_kw).abs() < 0.001);
    }
}
