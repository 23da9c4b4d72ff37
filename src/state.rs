//! Process-state snapshot consumed by the display engine.
//!
//! The surrounding application computes the process physics (pressure,
//! pump ramps, rod positions, thermal power) and hands the engine a
//! read-only [`ProcessSnapshot`] once per control tick.  Everything here is
//! a closed tagged variant so a new status or phase cannot silently fall
//! through a string lookup to a wrong default.

// ---------------------------------------------------------------------------
// Pump status
// ---------------------------------------------------------------------------

/// Circulation pump state, as reported by the satellite controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PumpStatus {
    #[default]
    Off = 0,
    Starting = 1,
    On = 2,
    Stopping = 3,
}

impl PumpStatus {
    /// Short status word as shown on the pump displays.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Starting => "START",
            Self::On => "ON",
            Self::Stopping => "STOP",
        }
    }

    /// Decode the wire status code; out-of-range codes read as `Off`
    /// (the safe resting value).
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Starting,
            2 => Self::On,
            3 => Self::Stopping,
            _ => Self::Off,
        }
    }
}

/// The three coolant loops, in pump-start order significance
/// (startup proceeds Tertiary → Secondary → Primary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PumpId {
    Primary = 0,
    Secondary = 1,
    Tertiary = 2,
}

impl PumpId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Secondary => "SECONDARY",
            Self::Tertiary => "TERTIARY",
        }
    }
}

// ---------------------------------------------------------------------------
// Control rods
// ---------------------------------------------------------------------------

/// The three control rods.  Guidance order matters: the safety rod must
/// reach its target before shim/regulating guidance is ever shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum RodId {
    Safety = 0,
    Shim = 1,
    Regulating = 2,
}

impl RodId {
    /// Display title (fits a 128 px line in the small font).
    pub const fn title(self) -> &'static str {
        match self {
            Self::Safety => "SAFETY ROD",
            Self::Shim => "SHIM ROD",
            Self::Regulating => "REG ROD",
        }
    }
}

/// Rod position limits (percent withdrawn).
pub const ROD_MIN: u8 = 0;
pub const ROD_MAX: u8 = 100;

// ---------------------------------------------------------------------------
// Operating mode and automatic-sequence phase
// ---------------------------------------------------------------------------

/// Simulation phase reported by the sequencer while in automatic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    Idle,
    StartupPressure,
    StartupPumps,
    ControlRods,
    PowerGeneration,
    NormalOperation,
    Shutdown,
    Emergency,
}

impl SimulationPhase {
    /// Parse the sequencer's phase label.  `None` for labels this build
    /// does not know — the guidance display falls back to a generic
    /// "in progress" line rather than erroring.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "idle" => Some(Self::Idle),
            "startup_pressure" => Some(Self::StartupPressure),
            "startup_pumps" => Some(Self::StartupPumps),
            "control_rods" => Some(Self::ControlRods),
            "power_generation" => Some(Self::PowerGeneration),
            "normal_operation" => Some(Self::NormalOperation),
            "shutdown" => Some(Self::Shutdown),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

/// Panel operating mode.  In automatic mode the snapshot carries the parsed
/// sequencer phase (`None` = unrecognized label).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelMode {
    #[default]
    Manual,
    Automatic(Option<SimulationPhase>),
}

// ---------------------------------------------------------------------------
// ProcessSnapshot
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of the process state, read-only to the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSnapshot {
    /// Pressurizer pressure (bar).
    pub pressure_bar: f32,
    /// Pump states, indexed by [`PumpId`].
    pub pumps: [PumpStatus; 3],
    /// Rod positions (0–100 % withdrawn), indexed by [`RodId`].
    pub rods: [u8; 3],
    /// Thermal power output (kW).
    pub thermal_kw: f32,
    /// Manual vs automatic operation.
    pub mode: PanelMode,
}

impl ProcessSnapshot {
    pub fn pump(&self, id: PumpId) -> PumpStatus {
        self.pumps[id as usize]
    }

    pub fn rod(&self, id: RodId) -> u8 {
        self.rods[id as usize]
    }

    /// True when every pump is fully on.
    pub fn all_pumps_on(&self) -> bool {
        self.pumps.iter().all(|p| *p == PumpStatus::On)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_status_codes_roundtrip() {
        for (code, status) in [
            (0, PumpStatus::Off),
            (1, PumpStatus::Starting),
            (2, PumpStatus::On),
            (3, PumpStatus::Stopping),
        ] {
            assert_eq!(PumpStatus::from_code(code), status);
            assert_eq!(status as u8, code);
        }
    }

    #[test]
    fn unknown_pump_code_reads_as_off() {
        assert_eq!(PumpStatus::from_code(42), PumpStatus::Off);
    }

    #[test]
    fn phase_labels_parse() {
        assert_eq!(
            SimulationPhase::from_label("startup_pumps"),
            Some(SimulationPhase::StartupPumps)
        );
        assert_eq!(
            SimulationPhase::from_label("normal_operation"),
            Some(SimulationPhase::NormalOperation)
        );
        assert_eq!(SimulationPhase::from_label("not_a_phase"), None);
    }

    #[test]
    fn all_pumps_on_requires_every_loop() {
        let mut snap = ProcessSnapshot::default();
        assert!(!snap.all_pumps_on());
        snap.pumps = [PumpStatus::On, PumpStatus::On, PumpStatus::Starting];
        assert!(!snap.all_pumps_on());
        snap.pumps = [PumpStatus::On; 3];
        assert!(snap.all_pumps_on());
    }
}
