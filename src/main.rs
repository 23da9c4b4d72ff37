//! PLTN panel demo — drives the full display engine against the simulation
//! adapters, replaying the manual startup procedure an operator would walk
//! through on the real panel.
//!
//! Run with `RUST_LOG=debug` to watch every channel select and settle.
//! With the `hw` feature the same engine drives the physical panel through
//! `adapters::oled` instead; only the adapter construction changes.

use std::time::Duration;

use anyhow::Result;
use log::info;

use pltn_panel::adapters::sim::{SimBus, SimSurface, StdDelay};
use pltn_panel::diagnostics;
use pltn_panel::state::{PanelMode, PumpId, PumpStatus, RodId, SimulationPhase};
use pltn_panel::{DisplayOrchestrator, MuxPair, PanelConfig, ProcessSnapshot, SlotId};

/// Control-loop cadence.
const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("PLTN panel v{} — display engine demo (simulated bus)", env!("CARGO_PKG_VERSION"));

    // ── 1. Simulated bus with the full panel attached ─────────
    let cfg = PanelConfig::default();
    let mut bus = SimBus::new();
    bus.attach(cfg.mux_a_addr, 0, 0x08); // control-link MCU
    for ch in 1..=7 {
        bus.attach(cfg.mux_a_addr, ch, cfg.display_addr);
    }
    bus.attach(cfg.mux_b_addr, 0, 0x0A); // visualizer MCU
    bus.attach(cfg.mux_b_addr, 1, cfg.display_addr);
    bus.attach(cfg.mux_b_addr, 2, cfg.display_addr);

    let mut mux = MuxPair::new(bus, &cfg);
    let mut delay = StdDelay;

    // ── 2. Startup diagnostics ────────────────────────────────
    let scan = mux.scan_all(&mut delay);
    diagnostics::log_scan(&scan);

    // ── 3. Display init ───────────────────────────────────────
    let mut orch = DisplayOrchestrator::new(cfg, std::array::from_fn(|_| SimSurface::new()));
    orch.init_all(&mut mux, &mut delay);
    info!("panel health: {}", orch.health());

    // ── 4. Manual startup procedure ───────────────────────────
    let mut snap = ProcessSnapshot::default();

    info!("phase: cold idle");
    run(&mut orch, &mut mux, &mut delay, &mut snap, 10, |_, _| {});

    info!("phase: pressurize to 150 bar");
    run(&mut orch, &mut mux, &mut delay, &mut snap, 30, |snap, _| {
        snap.pressure_bar = (snap.pressure_bar + 5.0).min(150.0);
    });

    info!("phase: start pumps (tertiary, secondary, primary)");
    for pump in [PumpId::Tertiary, PumpId::Secondary, PumpId::Primary] {
        run(&mut orch, &mut mux, &mut delay, &mut snap, 10, |snap, tick| {
            snap.pumps[pump as usize] = if tick < 5 {
                PumpStatus::Starting
            } else {
                PumpStatus::On
            };
        });
    }

    info!("phase: withdraw rods (safety, shim, regulating)");
    for rod in [RodId::Safety, RodId::Shim, RodId::Regulating] {
        run(&mut orch, &mut mux, &mut delay, &mut snap, 20, |snap, _| {
            snap.rods[rod as usize] = (snap.rods[rod as usize] + 5).min(100);
        });
    }

    info!("phase: raise power to rated");
    run(&mut orch, &mut mux, &mut delay, &mut snap, 25, |snap, _| {
        snap.thermal_kw = (snap.thermal_kw + 4_000.0).min(100_000.0);
    });

    info!("phase: steady state");
    run(&mut orch, &mut mux, &mut delay, &mut snap, 25, |_, _| {});

    // ── 5. Automatic-mode excursion ───────────────────────────
    info!("phase: automatic sequence display");
    snap.mode = PanelMode::Automatic(SimulationPhase::from_label("normal_operation"));
    run(&mut orch, &mut mux, &mut delay, &mut snap, 10, |_, _| {});

    // ── 6. Emergency stop: jump, don't sweep ──────────────────
    info!("phase: emergency stop");
    snap.mode = PanelMode::Manual;
    snap.pressure_bar = 0.0;
    snap.rods = [0; 3];
    snap.pumps = [PumpStatus::Stopping; 3];
    snap.thermal_kw = 0.0;
    orch.resync(&snap);
    run(&mut orch, &mut mux, &mut delay, &mut snap, 10, |snap, tick| {
        if tick >= 5 {
            snap.pumps = [PumpStatus::Off; 3];
        }
    });

    // ── 7. Shutdown ───────────────────────────────────────────
    let health = orch.health();
    info!("final panel health: {health}");
    for slot in health.dead_slots() {
        info!("  dead slot: {}", slot.title());
    }
    mux.close();
    info!("panel released, done ({} slots)", SlotId::COUNT);
    Ok(())
}

/// Tick the engine `ticks` times, mutating the snapshot before each pass.
fn run(
    orch: &mut DisplayOrchestrator<SimSurface>,
    mux: &mut MuxPair<SimBus>,
    delay: &mut StdDelay,
    snap: &mut ProcessSnapshot,
    ticks: u32,
    mut step: impl FnMut(&mut ProcessSnapshot, u32),
) {
    for tick in 0..ticks {
        step(snap, tick);
        orch.update_all(mux, delay, snap);
        std::thread::sleep(TICK);
    }
}
