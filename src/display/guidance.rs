//! Operator guidance state machine for the status display.
//!
//! Turns the raw process snapshot into one short instruction per tick:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ mode change?  ──▶ mode banner (one tick)                 │
//! │ automatic?    ──▶ phase text (exhaustive match)          │
//! │ idle?         ──▶ alternating prompt (1 s blink)         │
//! │ otherwise     ──▶ RULES, top to bottom, first match wins │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The rule table is the classic fixed array of plain `fn` rows — no
//! closures, no `dyn`, no heap.  The order is load-bearing: the safety rod
//! must reach its target before shim/regulating guidance is ever shown, and
//! pumps start Tertiary → Secondary → Primary, never reordered.

use core::fmt::Write as _;
use std::time::Instant;

use crate::config::PanelConfig;
use crate::state::{PanelMode, ProcessSnapshot, PumpId, PumpStatus, RodId, SimulationPhase, ROD_MAX};

/// One rendered guidance line (fits the 128 px width in the small font).
pub type Line = heapless::String<22>;

/// What the status display should show this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidanceFrame {
    /// Mode name, large and centered — shown once per mode transition.
    Banner(&'static str),
    /// Instruction + detail pair.
    Lines(Line, Line),
}

fn line(s: &str) -> Line {
    let mut l = Line::new();
    let _ = l.push_str(s);
    l
}

fn lines(a: &str, b: &str) -> (Line, Line) {
    (line(a), line(b))
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// One row of the ordered instruction table.
pub struct GuidanceRule {
    pub name: &'static str,
    /// Does this rule fire for the given state?
    pub applies: fn(&PanelConfig, &ProcessSnapshot) -> bool,
    /// Instruction text, evaluated only when `applies` returned true.
    pub render: fn(&PanelConfig, &ProcessSnapshot) -> (Line, Line),
}

/// The manual-mode instruction rules, evaluated top to bottom.
pub static RULES: [GuidanceRule; 7] = [
    GuidanceRule {
        name: "raise-pressure-initial",
        applies: below_pump_start_pressure,
        render: render_raise_to_pump_start,
    },
    GuidanceRule {
        name: "pump-start-sequence",
        applies: in_pump_start_band,
        render: render_pump_sequence,
    },
    GuidanceRule {
        name: "raise-pressure-operating",
        applies: below_operating_pressure,
        render: render_raise_to_operating,
    },
    GuidanceRule {
        name: "raise-safety-rod",
        applies: safety_rod_low,
        render: render_raise_safety,
    },
    GuidanceRule {
        name: "raise-shim-rod",
        applies: shim_rod_low,
        render: render_raise_shim,
    },
    GuidanceRule {
        name: "raise-regulating-rod",
        applies: regulating_rod_low,
        render: render_raise_regulating,
    },
    GuidanceRule {
        name: "power-readout",
        applies: always,
        render: render_power_readout,
    },
];

// ── Predicates ──

fn below_pump_start_pressure(cfg: &PanelConfig, s: &ProcessSnapshot) -> bool {
    s.pressure_bar < cfg.pump_start_pressure
}

fn in_pump_start_band(cfg: &PanelConfig, s: &ProcessSnapshot) -> bool {
    s.pressure_bar >= cfg.pump_start_pressure && s.pressure_bar < cfg.operating_pressure
}

fn below_operating_pressure(cfg: &PanelConfig, s: &ProcessSnapshot) -> bool {
    s.pressure_bar < cfg.operating_pressure
}

fn safety_rod_low(_: &PanelConfig, s: &ProcessSnapshot) -> bool {
    s.rod(RodId::Safety) < ROD_MAX
}

fn shim_rod_low(_: &PanelConfig, s: &ProcessSnapshot) -> bool {
    s.rod(RodId::Safety) == ROD_MAX && s.rod(RodId::Shim) < ROD_MAX
}

fn regulating_rod_low(_: &PanelConfig, s: &ProcessSnapshot) -> bool {
    s.rod(RodId::Shim) == ROD_MAX && s.rod(RodId::Regulating) < ROD_MAX
}

fn always(_: &PanelConfig, _: &ProcessSnapshot) -> bool {
    true
}

// ── Renderers ──

fn render_raise_to_pump_start(cfg: &PanelConfig, _: &ProcessSnapshot) -> (Line, Line) {
    let mut detail = Line::new();
    let _ = write!(detail, "TO {:.0} BAR", cfg.pump_start_pressure);
    (line("RAISE PRESSURE"), detail)
}

fn render_pump_sequence(cfg: &PanelConfig, s: &ProcessSnapshot) -> (Line, Line) {
    // Fixed startup order: cooling loops first, reactor loop last.
    for id in [PumpId::Tertiary, PumpId::Secondary, PumpId::Primary] {
        match s.pump(id) {
            PumpStatus::On => continue,
            PumpStatus::Starting => {
                let mut head = Line::new();
                let _ = write!(head, "{} PUMP", id.name());
                return (head, line("STARTING, WAIT"));
            }
            PumpStatus::Off | PumpStatus::Stopping => {
                return (line("START PUMP"), line(id.name()));
            }
        }
    }
    render_raise_to_operating(cfg, s)
}

fn render_raise_to_operating(cfg: &PanelConfig, _: &ProcessSnapshot) -> (Line, Line) {
    let mut detail = Line::new();
    let _ = write!(detail, "TO {:.0} BAR", cfg.operating_pressure);
    (line("RAISE PRESSURE"), detail)
}

fn rod_progress(position: u8) -> Line {
    let mut detail = Line::new();
    let _ = write!(detail, "TO 100%  NOW {position}%");
    detail
}

fn render_raise_safety(_: &PanelConfig, s: &ProcessSnapshot) -> (Line, Line) {
    (line("RAISE SAFETY ROD"), rod_progress(s.rod(RodId::Safety)))
}

fn render_raise_shim(_: &PanelConfig, s: &ProcessSnapshot) -> (Line, Line) {
    // Once both fine rods are moving, name them jointly.
    if s.rod(RodId::Shim) > 0 && s.rod(RodId::Regulating) > 0 {
        return lines("RAISE SHIM + REG", "RODS TO 100%");
    }
    (line("RAISE SHIM ROD"), rod_progress(s.rod(RodId::Shim)))
}

fn render_raise_regulating(_: &PanelConfig, s: &ProcessSnapshot) -> (Line, Line) {
    (line("RAISE REG ROD"), rod_progress(s.rod(RodId::Regulating)))
}

fn render_power_readout(cfg: &PanelConfig, s: &ProcessSnapshot) -> (Line, Line) {
    let mut detail = Line::new();
    let _ = write!(detail, "{:.1} MWe", s.thermal_kw / 1000.0);
    if s.thermal_kw < cfg.power_risen_fraction * cfg.rated_power_kw {
        (line("POWER RISING"), detail)
    } else {
        (line("FULL POWER"), detail)
    }
}

// ---------------------------------------------------------------------------
// Idle detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleKind {
    /// Everything at its off/zero rest value.
    Cold,
    /// Rods fully withdrawn, power at rated steady state.
    FullPower,
}

fn idle_kind(cfg: &PanelConfig, s: &ProcessSnapshot) -> Option<IdleKind> {
    let cold = s.pressure_bar <= 0.0
        && s.pumps.iter().all(|p| *p == PumpStatus::Off)
        && s.rods.iter().all(|r| *r == 0);
    if cold {
        return Some(IdleKind::Cold);
    }

    let full = s.rods.iter().all(|r| *r == ROD_MAX)
        && s.thermal_kw >= cfg.full_power_fraction * cfg.rated_power_kw;
    if full {
        return Some(IdleKind::FullPower);
    }

    None
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeKind {
    Manual,
    Automatic,
}

fn mode_kind(mode: PanelMode) -> ModeKind {
    match mode {
        PanelMode::Manual => ModeKind::Manual,
        PanelMode::Automatic(_) => ModeKind::Automatic,
    }
}

/// Guidance memory: mode banner bookkeeping and the idle blink.
pub struct GuidanceEngine {
    last_mode: Option<ModeKind>,
    banner_shown: bool,
    blink_phase: bool,
    blink_last_toggle: Option<Instant>,
}

impl Default for GuidanceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidanceEngine {
    pub fn new() -> Self {
        Self {
            last_mode: None,
            banner_shown: false,
            blink_phase: false,
            blink_last_toggle: None,
        }
    }

    /// Compute the frame for this tick.
    ///
    /// The mode banner claims the first tick after a transition (and
    /// startup); instructions resume once
    /// [`confirm_banner`](Self::confirm_banner) acknowledges a successful
    /// banner push.
    pub fn evaluate(
        &mut self,
        cfg: &PanelConfig,
        snap: &ProcessSnapshot,
        now: Instant,
    ) -> GuidanceFrame {
        let kind = mode_kind(snap.mode);
        if self.last_mode != Some(kind) {
            self.last_mode = Some(kind);
            self.banner_shown = false;
        }
        if !self.banner_shown {
            return GuidanceFrame::Banner(match kind {
                ModeKind::Manual => "MODE: MANUAL",
                ModeKind::Automatic => "MODE: AUTOMATIC",
            });
        }

        match snap.mode {
            PanelMode::Automatic(phase) => {
                let (a, b) = phase_text(phase);
                GuidanceFrame::Lines(line(a), line(b))
            }
            PanelMode::Manual => {
                if let Some(kind) = idle_kind(cfg, snap) {
                    let (a, b) = self.idle_prompt(cfg, kind, now);
                    return GuidanceFrame::Lines(line(a), line(b));
                }

                // First match wins; the final rule always applies.
                for rule in &RULES {
                    if (rule.applies)(cfg, snap) {
                        let (a, b) = (rule.render)(cfg, snap);
                        return GuidanceFrame::Lines(a, b);
                    }
                }
                debug_assert!(false, "rule table lost its total fallback");
                let (a, b) = (RULES[RULES.len() - 1].render)(cfg, snap);
                GuidanceFrame::Lines(a, b)
            }
        }
    }

    /// Acknowledge that the mode banner reached the display.  Until then
    /// every tick re-offers the banner (a failed push is retried).
    pub fn confirm_banner(&mut self) {
        self.banner_shown = true;
    }

    fn idle_prompt(
        &mut self,
        cfg: &PanelConfig,
        kind: IdleKind,
        now: Instant,
    ) -> (&'static str, &'static str) {
        match self.blink_last_toggle {
            None => self.blink_last_toggle = Some(now),
            Some(prev) => {
                if now.saturating_duration_since(prev).as_secs_f32() >= cfg.idle_blink_secs {
                    self.blink_phase = !self.blink_phase;
                    self.blink_last_toggle = Some(now);
                }
            }
        }

        match (kind, self.blink_phase) {
            (IdleKind::Cold, false) => ("SIMULATOR READY", ""),
            (IdleKind::Cold, true) => ("PRESS A CONTROL", ""),
            (IdleKind::FullPower, false) => ("FULL POWER", ""),
            (IdleKind::FullPower, true) => ("STEADY STATE", ""),
        }
    }
}

/// Automatic-sequence text, keyed on the parsed phase.  `None` is an
/// unrecognized label from the sequencer — generic line, never an error.
fn phase_text(phase: Option<SimulationPhase>) -> (&'static str, &'static str) {
    match phase {
        Some(SimulationPhase::Idle) => ("AUTO SEQUENCE", "WAITING TO START"),
        Some(SimulationPhase::StartupPressure) => ("PRESSURIZING", "AUTO IN PROGRESS"),
        Some(SimulationPhase::StartupPumps) => ("STARTING PUMPS", "AUTO IN PROGRESS"),
        Some(SimulationPhase::ControlRods) => ("WITHDRAWING RODS", "AUTO IN PROGRESS"),
        Some(SimulationPhase::PowerGeneration) => ("RAISING POWER", "AUTO IN PROGRESS"),
        Some(SimulationPhase::NormalOperation) => ("NORMAL OPERATION", "AT FULL POWER"),
        Some(SimulationPhase::Shutdown) => ("SHUTTING DOWN", "AUTO IN PROGRESS"),
        Some(SimulationPhase::Emergency) => ("EMERGENCY STOP", "SCRAM ACTIVE"),
        None => ("AUTO SEQUENCE", "IN PROGRESS"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cfg() -> PanelConfig {
        PanelConfig::default()
    }

    /// Engine with the startup banner already acknowledged.
    fn ready_engine(snap: &ProcessSnapshot) -> (GuidanceEngine, Instant) {
        let mut eng = GuidanceEngine::new();
        let t0 = Instant::now();
        let frame = eng.evaluate(&cfg(), snap, t0);
        assert!(matches!(frame, GuidanceFrame::Banner(_)));
        eng.confirm_banner();
        (eng, t0)
    }

    fn manual(pressure: f32, pumps: [PumpStatus; 3], rods: [u8; 3], kw: f32) -> ProcessSnapshot {
        ProcessSnapshot {
            pressure_bar: pressure,
            pumps,
            rods,
            thermal_kw: kw,
            mode: PanelMode::Manual,
        }
    }

    fn first_line(frame: &GuidanceFrame) -> &str {
        match frame {
            GuidanceFrame::Lines(a, _) => a.as_str(),
            GuidanceFrame::Banner(_) => panic!("expected instruction lines"),
        }
    }

    fn second_line(frame: &GuidanceFrame) -> &str {
        match frame {
            GuidanceFrame::Lines(_, b) => b.as_str(),
            GuidanceFrame::Banner(_) => panic!("expected instruction lines"),
        }
    }

    #[test]
    fn banner_shows_until_confirmed_then_never_again() {
        let snap = manual(30.0, [PumpStatus::Off; 3], [0; 3], 0.0);
        let mut eng = GuidanceEngine::new();
        let t0 = Instant::now();

        // Unconfirmed banner is re-offered (failed push retry path).
        assert_eq!(eng.evaluate(&cfg(), &snap, t0), GuidanceFrame::Banner("MODE: MANUAL"));
        assert_eq!(eng.evaluate(&cfg(), &snap, t0), GuidanceFrame::Banner("MODE: MANUAL"));

        eng.confirm_banner();
        assert!(matches!(eng.evaluate(&cfg(), &snap, t0), GuidanceFrame::Lines(..)));
    }

    #[test]
    fn mode_transition_rearms_the_banner() {
        let mut snap = manual(150.0, [PumpStatus::On; 3], [100, 50, 0], 1000.0);
        let (mut eng, t0) = ready_engine(&snap);

        snap.mode = PanelMode::Automatic(Some(SimulationPhase::ControlRods));
        assert_eq!(
            eng.evaluate(&cfg(), &snap, t0),
            GuidanceFrame::Banner("MODE: AUTOMATIC")
        );
        eng.confirm_banner();

        snap.mode = PanelMode::Manual;
        assert_eq!(eng.evaluate(&cfg(), &snap, t0), GuidanceFrame::Banner("MODE: MANUAL"));
    }

    #[test]
    fn cold_idle_blinks_every_second() {
        let snap = manual(0.0, [PumpStatus::Off; 3], [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let f0 = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&f0), "SIMULATOR READY");

        // Under a second: same phrase.
        let f1 = eng.evaluate(&cfg(), &snap, t0 + Duration::from_millis(600));
        assert_eq!(first_line(&f1), "SIMULATOR READY");

        // Past a second: the other phrase.
        let f2 = eng.evaluate(&cfg(), &snap, t0 + Duration::from_millis(1100));
        assert_eq!(first_line(&f2), "PRESS A CONTROL");

        // And back.
        let f3 = eng.evaluate(&cfg(), &snap, t0 + Duration::from_millis(2200));
        assert_eq!(first_line(&f3), "SIMULATOR READY");
    }

    #[test]
    fn low_pressure_asks_for_45_bar() {
        let snap = manual(30.0, [PumpStatus::Off; 3], [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "RAISE PRESSURE");
        assert_eq!(second_line(&frame), "TO 45 BAR");
    }

    #[test]
    fn pump_sequence_starts_with_tertiary() {
        let snap = manual(45.0, [PumpStatus::Off; 3], [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "START PUMP");
        assert_eq!(second_line(&frame), "TERTIARY");
    }

    #[test]
    fn pump_sequence_waits_while_starting() {
        let mut pumps = [PumpStatus::Off; 3];
        pumps[PumpId::Tertiary as usize] = PumpStatus::Starting;
        let snap = manual(50.0, pumps, [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "TERTIARY PUMP");
        assert_eq!(second_line(&frame), "STARTING, WAIT");
    }

    #[test]
    fn pump_sequence_is_tertiary_secondary_primary() {
        let mut pumps = [PumpStatus::Off; 3];
        pumps[PumpId::Tertiary as usize] = PumpStatus::On;
        let snap = manual(50.0, pumps, [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);
        assert_eq!(second_line(&eng.evaluate(&cfg(), &snap, t0)), "SECONDARY");

        let mut pumps = pumps;
        pumps[PumpId::Secondary as usize] = PumpStatus::On;
        let snap = manual(50.0, pumps, [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);
        assert_eq!(second_line(&eng.evaluate(&cfg(), &snap, t0)), "PRIMARY");
    }

    #[test]
    fn all_pumps_on_asks_for_operating_pressure() {
        let snap = manual(60.0, [PumpStatus::On; 3], [0; 3], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "RAISE PRESSURE");
        assert_eq!(second_line(&frame), "TO 140 BAR");
    }

    #[test]
    fn safety_rod_guidance_precedes_shim() {
        let snap = manual(140.0, [PumpStatus::On; 3], [40, 0, 0], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "RAISE SAFETY ROD");
        assert_eq!(second_line(&frame), "TO 100%  NOW 40%");
    }

    #[test]
    fn shim_before_regulating_while_shim_below_max() {
        // Safety complete, shim untouched — never ask for the regulating rod.
        let snap = manual(140.0, [PumpStatus::On; 3], [100, 0, 0], 0.0);
        let (mut eng, t0) = ready_engine(&snap);
        assert_eq!(first_line(&eng.evaluate(&cfg(), &snap, t0)), "RAISE SHIM ROD");
    }

    #[test]
    fn shim_and_regulating_named_jointly_once_both_move() {
        let snap = manual(140.0, [PumpStatus::On; 3], [100, 40, 20], 0.0);
        let (mut eng, t0) = ready_engine(&snap);
        assert_eq!(first_line(&eng.evaluate(&cfg(), &snap, t0)), "RAISE SHIM + REG");
    }

    #[test]
    fn regulating_rod_guidance_after_shim_complete() {
        let snap = manual(140.0, [PumpStatus::On; 3], [100, 100, 60], 0.0);
        let (mut eng, t0) = ready_engine(&snap);

        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "RAISE REG ROD");
        assert_eq!(second_line(&frame), "TO 100%  NOW 60%");
    }

    #[test]
    fn power_phrasing_flips_at_risen_threshold() {
        let rising = manual(150.0, [PumpStatus::On; 3], [100, 100, 100], 40_000.0);
        let (mut eng, t0) = ready_engine(&rising);
        let frame = eng.evaluate(&cfg(), &rising, t0);
        assert_eq!(first_line(&frame), "POWER RISING");
        assert_eq!(second_line(&frame), "40.0 MWe");

        let near_full = manual(150.0, [PumpStatus::On; 3], [100, 100, 100], 96_000.0);
        let (mut eng, t0) = ready_engine(&near_full);
        assert_eq!(first_line(&eng.evaluate(&cfg(), &near_full, t0)), "FULL POWER");
    }

    #[test]
    fn full_power_steady_state_is_idle_blink() {
        let snap = manual(150.0, [PumpStatus::On; 3], [100, 100, 100], 99_700.0);
        let (mut eng, t0) = ready_engine(&snap);

        assert_eq!(first_line(&eng.evaluate(&cfg(), &snap, t0)), "FULL POWER");
        let later = eng.evaluate(&cfg(), &snap, t0 + Duration::from_millis(1100));
        assert_eq!(first_line(&later), "STEADY STATE");
    }

    #[test]
    fn automatic_phase_text_is_exhaustive_and_total() {
        let mut snap = manual(0.0, [PumpStatus::Off; 3], [0; 3], 0.0);
        snap.mode = PanelMode::Automatic(Some(SimulationPhase::StartupPumps));
        let (mut eng, t0) = ready_engine(&snap);
        assert_eq!(first_line(&eng.evaluate(&cfg(), &snap, t0)), "STARTING PUMPS");

        // Unrecognized label parsed to None upstream: generic line.
        snap.mode = PanelMode::Automatic(None);
        let frame = eng.evaluate(&cfg(), &snap, t0);
        assert_eq!(first_line(&frame), "AUTO SEQUENCE");
        assert_eq!(second_line(&frame), "IN PROGRESS");
    }

    #[test]
    fn rule_order_matches_the_procedure() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "raise-pressure-initial",
                "pump-start-sequence",
                "raise-pressure-operating",
                "raise-safety-rod",
                "raise-shim-rod",
                "raise-regulating-rod",
                "power-readout",
            ]
        );
    }
}
