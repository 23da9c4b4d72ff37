//! Coordinated access to the chained expander-chip pair.
//!
//! Two expander chips sit on one shared wire pair: chip A (0x70) carries the
//! seven primary displays plus the control-link MCU on channel 0; chip B
//! (0x71) carries the power and status displays plus the visualizer MCU.
//! [`MuxPair`] owns the bus handle and both arbiters, and is the only
//! component allowed to touch either chip — `update_all` is a de facto
//! critical section over the wire pair.
//!
//! ## The cross-chip rules
//!
//! Every display answers at the same device address, so at most one chip may
//! expose a channel at any moment.  Whenever a selection moves from one chip
//! to the other, the coordinator first releases the outgoing chip (all
//! channels off), then inserts a settling pause longer than the per-write
//! settle, because the previous chip's transients are still dying down on
//! the shared wires.  Never settle twice for the same chip; settle exactly
//! once on a switch.  Whether the chips truly share one electrical bus could
//! not be confirmed from the wiring docs — the delay stays until the
//! topology is verified (see `chip_switch_settle_ms` in the config).

use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::config::PanelConfig;
use crate::mux::arbiter::ChannelArbiter;
use crate::ports::BusPort;

use std::collections::BTreeMap;

/// Which expander chip served the most recent selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipId {
    A,
    B,
}

/// Startup scan results for both chips: channel → acknowledging addresses.
#[derive(Debug, Default)]
pub struct MuxScan {
    pub chip_a: BTreeMap<u8, Vec<u8>>,
    pub chip_b: BTreeMap<u8, Vec<u8>>,
}

impl MuxScan {
    /// Total devices seen across both chips.
    pub fn device_count(&self) -> usize {
        self.chip_a.values().chain(self.chip_b.values()).map(Vec::len).sum()
    }
}

/// Owner of the shared bus and both channel arbiters.
pub struct MuxPair<B: BusPort> {
    bus: B,
    chip_a: ChannelArbiter,
    chip_b: ChannelArbiter,
    last_chip: Option<ChipId>,
    chip_switch_settle_ms: u32,
}

impl<B: BusPort> MuxPair<B> {
    pub fn new(bus: B, cfg: &PanelConfig) -> Self {
        Self {
            bus,
            chip_a: ChannelArbiter::new("mux-a", cfg.mux_a_addr, cfg.channel_settle_ms),
            chip_b: ChannelArbiter::new("mux-b", cfg.mux_b_addr, cfg.channel_settle_ms),
            last_chip: None,
            chip_switch_settle_ms: cfg.chip_switch_settle_ms,
        }
    }

    /// Expose display `index` (1–7) on chip A.
    ///
    /// Channel 0 on chip A is reserved for the control-link MCU and is not
    /// reachable through this call.
    pub fn select_display<D: DelayNs>(&mut self, delay: &mut D, index: u8) -> bool {
        if !(1..=7).contains(&index) {
            error!("mux: display index {index} out of range 1-7");
            return false;
        }
        self.route(delay, ChipId::A, index)
    }

    /// Expose secondary channel `index` (0–2) on chip B:
    /// 0 = visualizer MCU, 1–2 = the remaining two displays.
    pub fn select_secondary<D: DelayNs>(&mut self, delay: &mut D, index: u8) -> bool {
        if index > 2 {
            error!("mux: secondary index {index} out of range 0-2");
            return false;
        }
        self.route(delay, ChipId::B, index)
    }

    /// Ack-probe `addr` on whatever channel is currently exposed.
    pub fn probe_device(&mut self, addr: u8) -> bool {
        self.bus.probe(addr)
    }

    /// Read access to the owned bus handle (diagnostics and tests).
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Sweep both chips for startup diagnostics.
    pub fn scan_all<D: DelayNs>(&mut self, delay: &mut D) -> MuxScan {
        info!("mux: scanning both expander chips");
        // The sweeps drive the chips directly; park both first so a stale
        // channel on one cannot ghost-ack through the other's scan.
        self.chip_a.deselect_all(&mut self.bus);
        self.chip_b.deselect_all(&mut self.bus);
        let scan = MuxScan {
            chip_a: self.chip_a.probe(&mut self.bus, delay),
            chip_b: self.chip_b.probe(&mut self.bus, delay),
        };
        // The probes rewrote channel masks behind the settle bookkeeping;
        // the next routed select must not assume chip affinity.
        self.last_chip = None;
        scan
    }

    /// Disable all channels on both chips and release the pair.
    pub fn close(&mut self) -> bool {
        let a = self.chip_a.deselect_all(&mut self.bus);
        let b = self.chip_b.deselect_all(&mut self.bus);
        self.last_chip = None;
        info!("mux: closed (chip A: {a}, chip B: {b})");
        a && b
    }

    fn route<D: DelayNs>(&mut self, delay: &mut D, chip: ChipId, channel: u8) -> bool {
        if self.last_chip != Some(chip) {
            // Crossing chips (or first use): release the other chip so only
            // one display is ever exposed at the shared device address, then
            // let the wire settle before the new chip's select.
            match chip {
                ChipId::A => self.chip_b.deselect_all(&mut self.bus),
                ChipId::B => self.chip_a.deselect_all(&mut self.bus),
            };
            if self.last_chip.is_some() {
                delay.delay_ms(self.chip_switch_settle_ms);
            }
        }
        // The settle is spent either way; a failed select below retries on
        // the next tick without settling again for the same chip.
        self.last_chip = Some(chip);

        match chip {
            ChipId::A => self.chip_a.select(&mut self.bus, delay, channel, false),
            ChipId::B => self.chip_b.select(&mut self.bus, delay, channel, false),
        }
    }
}
