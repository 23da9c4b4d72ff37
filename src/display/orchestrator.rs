//! Nine-slot display orchestration.
//!
//! Owns one [`DisplaySlot`] per physical display and drives them once per
//! control tick in a fixed order chosen to minimize chip switches: all
//! chip-A slots first (channels 1–7), then the two chip-B slots, so a full
//! pass crosses chips once on the way in and once on the way out at most.
//!
//! Per slot and tick the pipeline is: decide whether anything changed
//! (interpolator gate or status-word comparison), select the slot's channel
//! through the [`MuxPair`], render the frame off-screen, push it, and let
//! the controller settle.  A slot that failed its startup probe is excluded
//! from all of this for the life of the process — partial hardware failure
//! must never stop the control loop.

use core::fmt::Write as _;
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::PanelConfig;
use crate::diagnostics::PanelHealth;
use crate::display::guidance::{GuidanceEngine, GuidanceFrame};
use crate::display::interp::ValueInterpolator;
use crate::mux::MuxPair;
use crate::ports::{BusPort, FontSize, FrameSurface};
use crate::state::{ProcessSnapshot, PumpId, RodId};

/// Rendered-content cache key; sized for the two-line guidance frames.
type SlotText = heapless::String<48>;

/// One text line buffer for value formatting.
type ValueText = heapless::String<22>;

// ---------------------------------------------------------------------------
// Slot identity and routing
// ---------------------------------------------------------------------------

/// The nine panel displays, in physical update order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    Pressurizer,
    PumpPrimary,
    PumpSecondary,
    PumpTertiary,
    SafetyRod,
    ShimRod,
    RegulatingRod,
    Power,
    Status,
}

impl SlotId {
    pub const COUNT: usize = 9;

    /// Update order: chip A channels 1–7, then chip B channels 1–2.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Pressurizer,
        Self::PumpPrimary,
        Self::PumpSecondary,
        Self::PumpTertiary,
        Self::SafetyRod,
        Self::ShimRod,
        Self::RegulatingRod,
        Self::Power,
        Self::Status,
    ];

    /// Display title line.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pressurizer => "PRESSURIZER",
            Self::PumpPrimary => "PUMP PRIMARY",
            Self::PumpSecondary => "PUMP SECONDARY",
            Self::PumpTertiary => "PUMP TERTIARY",
            Self::SafetyRod => "SAFETY ROD",
            Self::ShimRod => "SHIM ROD",
            Self::RegulatingRod => "REG ROD",
            Self::Power => "POWER",
            Self::Status => "STATUS",
        }
    }

    const fn route(self) -> SlotRoute {
        match self {
            Self::Pressurizer => SlotRoute::Display(1),
            Self::PumpPrimary => SlotRoute::Display(2),
            Self::PumpSecondary => SlotRoute::Display(3),
            Self::PumpTertiary => SlotRoute::Display(4),
            Self::SafetyRod => SlotRoute::Display(5),
            Self::ShimRod => SlotRoute::Display(6),
            Self::RegulatingRod => SlotRoute::Display(7),
            Self::Power => SlotRoute::Secondary(1),
            Self::Status => SlotRoute::Secondary(2),
        }
    }

    /// The pump whose status this slot mirrors, if any.
    const fn pump(self) -> Option<PumpId> {
        match self {
            Self::PumpPrimary => Some(PumpId::Primary),
            Self::PumpSecondary => Some(PumpId::Secondary),
            Self::PumpTertiary => Some(PumpId::Tertiary),
            _ => None,
        }
    }
}

/// Chip + channel binding of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotRoute {
    /// Chip A display channel (1–7).
    Display(u8),
    /// Chip B secondary channel (1–2).
    Secondary(u8),
}

// ---------------------------------------------------------------------------
// DisplaySlot
// ---------------------------------------------------------------------------

/// One display: route, frame surface, change-detection state, liveness.
struct DisplaySlot<S> {
    id: SlotId,
    route: SlotRoute,
    surface: S,
    interp: Option<ValueInterpolator>,
    /// Content last *successfully pushed*; a failed push leaves this
    /// untouched so the next tick detects the change again.
    last_text: Option<SlotText>,
    initialized: bool,
}

impl<S> DisplaySlot<S> {
    fn new(id: SlotId, surface: S, cfg: &PanelConfig) -> Self {
        let interp = match id {
            SlotId::Pressurizer => Some(ValueInterpolator::new("pressure", cfg.pressure_speed)),
            SlotId::SafetyRod => Some(ValueInterpolator::new("safety-rod", cfg.rod_speed)),
            SlotId::ShimRod => Some(ValueInterpolator::new("shim-rod", cfg.rod_speed)),
            SlotId::RegulatingRod => Some(ValueInterpolator::new("reg-rod", cfg.rod_speed)),
            SlotId::Power => Some(ValueInterpolator::new("power", cfg.power_speed)),
            _ => None,
        };
        Self {
            id,
            route: id.route(),
            surface,
            interp,
            last_text: None,
            initialized: false,
        }
    }
}

// ---------------------------------------------------------------------------
// DisplayOrchestrator
// ---------------------------------------------------------------------------

/// Drives the nine display slots and hosts the operator guidance engine.
pub struct DisplayOrchestrator<S: FrameSurface> {
    cfg: PanelConfig,
    slots: [DisplaySlot<S>; SlotId::COUNT],
    guidance: GuidanceEngine,
}

impl<S: FrameSurface> DisplayOrchestrator<S> {
    /// `surfaces` in [`SlotId::ALL`] order.
    pub fn new(cfg: PanelConfig, surfaces: [S; SlotId::COUNT]) -> Self {
        let mut surfaces = surfaces.into_iter();
        let slots = SlotId::ALL.map(|id| {
            let surface = surfaces.next().expect("one surface per slot");
            DisplaySlot::new(id, surface, &cfg)
        });
        Self {
            cfg,
            slots,
            guidance: GuidanceEngine::new(),
        }
    }

    /// Probe and initialize every slot.  A slot that never responds within
    /// the bounded probe budget is marked dead and skipped forever; the rest
    /// of the panel keeps working.  Returns the number of live slots.
    pub fn init_all<B: BusPort, D: DelayNs>(
        &mut self,
        mux: &mut MuxPair<B>,
        delay: &mut D,
    ) -> usize {
        for slot in &mut self.slots {
            slot.initialized = false;
            slot.last_text = None;

            if !select_route(mux, delay, slot.route) {
                warn!("{}: channel select failed during init", slot.id.title());
                continue;
            }
            if !probe_bounded(mux, delay, &self.cfg) {
                warn!(
                    "{}: no controller at 0x{:02X} within {} ms",
                    slot.id.title(),
                    self.cfg.display_addr,
                    self.cfg.probe_timeout_ms
                );
                continue;
            }
            if slot.surface.init().is_err() {
                warn!("{}: controller init failed", slot.id.title());
                continue;
            }

            // Ready banner.
            slot.surface.clear();
            slot.surface.draw_text_centered(1, slot.id.title(), FontSize::Small);
            slot.surface.draw_text_centered(12, "PLTN v3.0", FontSize::Regular);
            slot.surface.draw_text_centered(22, "Ready", FontSize::Small);
            if slot.surface.push().is_err() {
                warn!("{}: ready banner push failed", slot.id.title());
                continue;
            }

            slot.initialized = true;
            delay.delay_ms(self.cfg.push_settle_ms);
        }

        let active = self.slots.iter().filter(|s| s.initialized).count();
        info!("display init: {active} of {} active", SlotId::COUNT);
        active
    }

    /// Drive every slot from the snapshot.  Called once per control tick.
    pub fn update_all<B: BusPort, D: DelayNs>(
        &mut self,
        mux: &mut MuxPair<B>,
        delay: &mut D,
        snap: &ProcessSnapshot,
    ) {
        self.update_all_at(mux, delay, snap, Instant::now());
    }

    /// Deterministic core of [`update_all`](Self::update_all).
    pub fn update_all_at<B: BusPort, D: DelayNs>(
        &mut self,
        mux: &mut MuxPair<B>,
        delay: &mut D,
        snap: &ProcessSnapshot,
        now: Instant,
    ) {
        let cfg = &self.cfg;
        for slot in &mut self.slots {
            match slot.id {
                SlotId::Status => update_guidance_slot(cfg, slot, &mut self.guidance, mux, delay, snap, now),
                SlotId::PumpPrimary | SlotId::PumpSecondary | SlotId::PumpTertiary => {
                    update_pump_slot(cfg, slot, mux, delay, snap);
                }
                _ => update_value_slot(cfg, slot, mux, delay, snap, now),
            }
        }
    }

    /// Jump every slot to the snapshot instead of sweeping — used after an
    /// emergency stop and when re-synchronizing to existing state.
    pub fn resync(&mut self, snap: &ProcessSnapshot) {
        for slot in &mut self.slots {
            if let Some(interp) = slot.interp.as_mut() {
                if let Some(target) = interp_target(slot.id, snap) {
                    interp.reset(target);
                }
            }
            slot.last_text = None;
        }
        info!("display resync forced");
    }

    /// Render a short error frame on every live display.
    pub fn show_error_all<B: BusPort, D: DelayNs>(
        &mut self,
        mux: &mut MuxPair<B>,
        delay: &mut D,
        message: &str,
    ) {
        for slot in &mut self.slots {
            if !slot.initialized || !select_route(mux, delay, slot.route) {
                continue;
            }
            slot.surface.clear();
            slot.surface.draw_text_centered(1, "ERROR", FontSize::Small);
            slot.surface.draw_text_centered(10, "System", FontSize::Regular);
            slot.surface.draw_text_centered(22, message, FontSize::Small);
            if slot.surface.push().is_ok() {
                delay.delay_ms(self.cfg.push_settle_ms);
            }
            // Whatever was cached no longer matches the screen.
            slot.last_text = None;
            if let Some(interp) = slot.interp.as_mut() {
                interp.mark_stale();
            }
        }
    }

    /// Per-slot liveness summary for the health collaborator.
    pub fn health(&self) -> PanelHealth {
        PanelHealth {
            slots: self.slots.each_ref().map(|s| (s.id, s.initialized)),
        }
    }

    /// Borrow a slot's frame surface (diagnostics and tests).
    pub fn surface(&self, id: SlotId) -> &S {
        &self.slots.iter().find(|s| s.id == id).expect("all slots present").surface
    }

    /// Mutable access to a slot's frame surface.
    pub fn surface_mut(&mut self, id: SlotId) -> &mut S {
        &mut self.slots.iter_mut().find(|s| s.id == id).expect("all slots present").surface
    }
}

// ---------------------------------------------------------------------------
// Per-slot update paths
// ---------------------------------------------------------------------------

/// Interpolated value slots: pressurizer, the three rods, power.
fn update_value_slot<S: FrameSurface, B: BusPort, D: DelayNs>(
    cfg: &PanelConfig,
    slot: &mut DisplaySlot<S>,
    mux: &mut MuxPair<B>,
    delay: &mut D,
    snap: &ProcessSnapshot,
    now: Instant,
) {
    let Some(interp) = slot.interp.as_mut() else {
        return;
    };
    let Some(target) = interp_target(slot.id, snap) else {
        return;
    };

    interp.set_target(target);
    let value = interp.advance(now);
    if !interp.needs_update() {
        return;
    }
    if !slot.initialized {
        return;
    }

    if !select_route(mux, delay, slot.route) {
        interp.mark_stale();
        return;
    }

    slot.surface.clear();
    slot.surface.draw_text_centered(1, slot.id.title(), FontSize::Small);

    let mut text = ValueText::new();
    match slot.id {
        SlotId::Pressurizer => {
            let _ = write!(text, "{value} bar");
        }
        SlotId::Power => {
            let _ = write!(text, "{:.1} MWe", value as f32 / 1000.0);
        }
        _ => {
            let _ = write!(text, "{value}%");
        }
    }
    slot.surface.draw_text_centered(12, &text, FontSize::Large);
    if matches!(slot.id, SlotId::SafetyRod | SlotId::ShimRod | SlotId::RegulatingRod) {
        slot.surface.draw_progress_bar(2, 27, 124, 5, value as f32, 100.0);
    }

    if slot.surface.push().is_err() {
        warn!("{}: frame push failed", slot.id.title());
        if let Some(interp) = slot.interp.as_mut() {
            interp.mark_stale();
        }
        return;
    }
    delay.delay_ms(cfg.push_settle_ms);
}

/// Pump status slots: no interpolation, plain status-word comparison.
fn update_pump_slot<S: FrameSurface, B: BusPort, D: DelayNs>(
    cfg: &PanelConfig,
    slot: &mut DisplaySlot<S>,
    mux: &mut MuxPair<B>,
    delay: &mut D,
    snap: &ProcessSnapshot,
) {
    let Some(pump) = slot.id.pump() else {
        return;
    };
    let word = snap.pump(pump).label();

    if slot.last_text.as_deref() == Some(word) {
        return;
    }
    if !slot.initialized {
        return;
    }
    if !select_route(mux, delay, slot.route) {
        return; // last_text untouched — retried next tick
    }

    slot.surface.clear();
    slot.surface.draw_text_centered(1, slot.id.title(), FontSize::Small);
    slot.surface.draw_text_centered(12, word, FontSize::Large);

    if slot.surface.push().is_err() {
        warn!("{}: frame push failed", slot.id.title());
        return;
    }

    let mut cache = SlotText::new();
    let _ = cache.push_str(word);
    slot.last_text = Some(cache);
    delay.delay_ms(cfg.push_settle_ms);
}

/// The operator guidance slot.
fn update_guidance_slot<S: FrameSurface, B: BusPort, D: DelayNs>(
    cfg: &PanelConfig,
    slot: &mut DisplaySlot<S>,
    guidance: &mut GuidanceEngine,
    mux: &mut MuxPair<B>,
    delay: &mut D,
    snap: &ProcessSnapshot,
    now: Instant,
) {
    let frame = guidance.evaluate(cfg, snap, now);

    let mut key = SlotText::new();
    match &frame {
        GuidanceFrame::Banner(text) => {
            let _ = write!(key, "banner:{text}");
        }
        GuidanceFrame::Lines(a, b) => {
            let _ = write!(key, "{a}\n{b}");
        }
    }
    if slot.last_text.as_ref() == Some(&key) {
        return;
    }
    if !slot.initialized {
        return;
    }
    if !select_route(mux, delay, slot.route) {
        return;
    }

    slot.surface.clear();
    match &frame {
        GuidanceFrame::Banner(text) => {
            slot.surface.draw_text_centered(10, text, FontSize::Large);
        }
        GuidanceFrame::Lines(a, b) => {
            slot.surface.draw_text_centered(4, a, FontSize::Regular);
            slot.surface.draw_text_centered(18, b, FontSize::Regular);
        }
    }

    if slot.surface.push().is_err() {
        warn!("{}: frame push failed", slot.id.title());
        return;
    }
    if matches!(frame, GuidanceFrame::Banner(_)) {
        guidance.confirm_banner();
    }
    slot.last_text = Some(key);
    delay.delay_ms(cfg.push_settle_ms);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn interp_target(id: SlotId, snap: &ProcessSnapshot) -> Option<f32> {
    match id {
        SlotId::Pressurizer => Some(snap.pressure_bar),
        SlotId::SafetyRod => Some(f32::from(snap.rod(RodId::Safety))),
        SlotId::ShimRod => Some(f32::from(snap.rod(RodId::Shim))),
        SlotId::RegulatingRod => Some(f32::from(snap.rod(RodId::Regulating))),
        SlotId::Power => Some(snap.thermal_kw),
        _ => None,
    }
}

fn select_route<B: BusPort, D: DelayNs>(
    mux: &mut MuxPair<B>,
    delay: &mut D,
    route: SlotRoute,
) -> bool {
    match route {
        SlotRoute::Display(ch) => mux.select_display(delay, ch),
        SlotRoute::Secondary(ch) => mux.select_secondary(delay, ch),
    }
}

/// Ack-probe the display address within the configured per-slot budget.
fn probe_bounded<B: BusPort, D: DelayNs>(
    mux: &mut MuxPair<B>,
    delay: &mut D,
    cfg: &PanelConfig,
) -> bool {
    let mut spent_ms = 0;
    loop {
        if mux.probe_device(cfg.display_addr) {
            return true;
        }
        if spent_ms >= cfg.probe_timeout_ms {
            return false;
        }
        delay.delay_ms(cfg.probe_retry_ms);
        spent_ms += cfg.probe_retry_ms;
    }
}
