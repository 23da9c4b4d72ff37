//! Single channel-expander chip driver.
//!
//! One TCA9548A-class chip multiplexes the upstream bus onto eight
//! downstream channels; writing a one-hot mask exposes exactly one channel
//! and implicitly deselects the other seven.  Nine displays sharing a single
//! device address become individually addressable this way.
//!
//! ## Contract
//!
//! The arbiter caches the active channel.  Re-selecting the cached channel
//! without `force` performs no bus transaction — the control loop calls
//! select once per slot per tick, and redundant writes would saturate the
//! shared wire pair.  A failed write clears the cache to "unknown" so the
//! next select performs a genuine write.
//!
//! No method panics or returns `Err` on the hot path: failures are logged
//! and reported as `false`, and the next tick retries naturally.

use std::collections::BTreeMap;

use embedded_hal::delay::DelayNs;
use log::{debug, error, info};

use crate::ports::BusPort;

/// Channels per expander chip.
pub const CHANNEL_COUNT: u8 = 8;

/// Downstream address range swept by [`ChannelArbiter::probe`]
/// (the 7-bit range minus reserved addresses).
const PROBE_ADDR_FIRST: u8 = 0x03;
const PROBE_ADDR_LAST: u8 = 0x77;

/// Driver for one channel-expander chip.
pub struct ChannelArbiter {
    /// Chip name for log lines ("mux-a" / "mux-b").
    name: &'static str,
    /// The chip's own bus address.
    addr: u8,
    /// Cached active channel; `None` = unknown or all channels off.
    active: Option<u8>,
    /// Pause after each select write (ms).
    settle_ms: u32,
}

impl ChannelArbiter {
    pub fn new(name: &'static str, addr: u8, settle_ms: u32) -> Self {
        Self {
            name,
            addr,
            active: None,
            settle_ms,
        }
    }

    /// The chip's bus address.
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// The cached active channel, if known.
    pub fn active_channel(&self) -> Option<u8> {
        self.active
    }

    /// Expose `channel` (0–7), deselecting all others on this chip.
    ///
    /// Returns `true` without touching the bus when `channel` is already
    /// cached as active and `force` is false.  Out-of-range channels are a
    /// programming error: logged, `false`, no bus traffic.
    pub fn select<B: BusPort, D: DelayNs>(
        &mut self,
        bus: &mut B,
        delay: &mut D,
        channel: u8,
        force: bool,
    ) -> bool {
        if channel >= CHANNEL_COUNT {
            error!("{}: invalid channel {channel}, must be 0-7", self.name);
            return false;
        }

        if !force && self.active == Some(channel) {
            return true;
        }

        match bus.write_byte(self.addr, 1 << channel) {
            Ok(()) => {
                delay.delay_ms(self.settle_ms);
                self.active = Some(channel);
                debug!("{}: channel {channel} selected", self.name);
                true
            }
            Err(e) => {
                // Cache is unknown now — the chip may or may not have
                // latched the mask.  Force a real write next time.
                self.active = None;
                error!("{}: select channel {channel} failed: {e}", self.name);
                false
            }
        }
    }

    /// Disable every channel (no downstream device exposed).
    /// Used at shutdown and after detected failures.
    pub fn deselect_all<B: BusPort>(&mut self, bus: &mut B) -> bool {
        self.active = None;
        match bus.write_byte(self.addr, 0x00) {
            Ok(()) => {
                debug!("{}: all channels disabled", self.name);
                true
            }
            Err(e) => {
                error!("{}: deselect all failed: {e}", self.name);
                false
            }
        }
    }

    /// Sweep every channel and scan for acknowledging downstream devices.
    ///
    /// Startup diagnostics only — a full sweep is hundreds of transactions
    /// and has no place on the tick path.  Channels with no devices are
    /// omitted from the map.  Leaves all channels deselected.
    pub fn probe<B: BusPort, D: DelayNs>(
        &mut self,
        bus: &mut B,
        delay: &mut D,
    ) -> BTreeMap<u8, Vec<u8>> {
        let mut devices = BTreeMap::new();

        for channel in 0..CHANNEL_COUNT {
            if !self.select(bus, delay, channel, false) {
                continue;
            }

            let found: Vec<u8> = (PROBE_ADDR_FIRST..=PROBE_ADDR_LAST)
                .filter(|a| *a != self.addr && bus.probe(*a))
                .collect();

            if !found.is_empty() {
                info!(
                    "{}: channel {channel}: {:02x?}",
                    self.name,
                    found.as_slice()
                );
                devices.insert(channel, found);
            }
        }

        self.deselect_all(bus);
        devices
    }
}
