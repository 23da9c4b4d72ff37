//! Fuzz target: `GuidanceEngine::evaluate`
//!
//! Builds snapshots from arbitrary bytes — including wildly out-of-range
//! pressures, rod positions past 100 %, negative power, and unknown pump
//! status codes — and verifies the guidance surface never panics and always
//! produces a frame.
//!
//! cargo fuzz run fuzz_guidance

#![no_main]

use libfuzzer_sys::fuzz_target;
use pltn_panel::display::guidance::{GuidanceEngine, GuidanceFrame};
use pltn_panel::state::{PanelMode, ProcessSnapshot, PumpStatus, SimulationPhase};
use pltn_panel::PanelConfig;
use std::time::{Duration, Instant};

fuzz_target!(|data: &[u8]| {
    if data.len() < 12 {
        return;
    }

    let cfg = PanelConfig::default();
    let mut eng = GuidanceEngine::new();
    let t0 = Instant::now();

    // Each 12-byte chunk becomes one snapshot tick.
    for (i, chunk) in data.chunks_exact(12).enumerate() {
        let pressure = f32::from(i16::from_le_bytes([chunk[0], chunk[1]]));
        let kw = f32::from(i32::from_le_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]) as i16);
        let mode = match chunk[6] % 3 {
            0 => PanelMode::Manual,
            1 => PanelMode::Automatic(None),
            _ => {
                // Route arbitrary bytes through the label parser too.
                let label = core::str::from_utf8(&chunk[7..11]).unwrap_or("??");
                PanelMode::Automatic(SimulationPhase::from_label(label))
            }
        };
        let snap = ProcessSnapshot {
            pressure_bar: pressure,
            pumps: [
                PumpStatus::from_code(chunk[7]),
                PumpStatus::from_code(chunk[8]),
                PumpStatus::from_code(chunk[9]),
            ],
            rods: [chunk[9], chunk[10], chunk[11]],
            thermal_kw: kw,
            mode,
        };

        let now = t0 + Duration::from_millis(u64::from(chunk[11]) * (i as u64 + 1));
        match eng.evaluate(&cfg, &snap, now) {
            GuidanceFrame::Banner(text) => {
                assert!(!text.is_empty());
                eng.confirm_banner();
            }
            GuidanceFrame::Lines(a, _) => {
                assert!(!a.is_empty(), "instruction line must never be blank");
            }
        }
    }
});
