//! Simulation adapters — recording mocks for the bus, delays, and frame
//! surfaces.
//!
//! These back the test suite and the demo binary on hosts without panel
//! hardware.  Every call is recorded so tests can assert on the full
//! transaction history: which select masks hit which chip, how many settle
//! pauses were inserted, and what text landed on which display.
//!
//! [`SimBus`] models the latching behavior of real expander chips: each chip
//! holds its one-hot channel mask until the next write, and an ack-probe
//! sees every device behind every currently exposed channel.

use std::collections::HashMap;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::error::{BusError, DisplayError};
use crate::ports::{BusPort, FontSize, FrameSurface};

// ───────────────────────────────────────────────────────────────
// SimBus
// ───────────────────────────────────────────────────────────────

/// One recorded bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub addr: u8,
    pub value: u8,
}

/// Scriptable in-memory bus with two latching expander chips.
pub struct SimBus {
    /// Every write in order, including failed attempts' targets? No —
    /// only writes that the "wire" accepted.
    pub writes: Vec<BusWrite>,
    /// When set, every write fails with `BusError::Nack`.
    pub fail_writes: bool,
    /// Latched channel mask per expander chip address.
    masks: HashMap<u8, u8>,
    /// Devices wired behind (chip addr, channel).
    devices: HashMap<(u8, u8), Vec<u8>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            fail_writes: false,
            masks: HashMap::new(),
            devices: HashMap::new(),
        }
    }

    /// Wire a device at `dev_addr` behind `channel` of the chip at `chip`.
    pub fn attach(&mut self, chip: u8, channel: u8, dev_addr: u8) {
        self.devices.entry((chip, channel)).or_default().push(dev_addr);
    }

    /// Remove everything behind `channel` of `chip`.
    pub fn detach(&mut self, chip: u8, channel: u8) {
        self.devices.remove(&(chip, channel));
    }

    /// Number of select writes of `value` seen by `chip`.
    pub fn select_count(&self, chip: u8, value: u8) -> usize {
        self.writes.iter().filter(|w| w.addr == chip && w.value == value).count()
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusPort for SimBus {
    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), BusError> {
        if self.fail_writes {
            return Err(BusError::Nack);
        }
        self.writes.push(BusWrite { addr, value });
        self.masks.insert(addr, value);
        Ok(())
    }

    fn probe(&mut self, addr: u8) -> bool {
        self.masks.iter().any(|(chip, mask)| {
            (0..8u8).any(|ch| {
                mask & (1 << ch) != 0
                    && self
                        .devices
                        .get(&(*chip, ch))
                        .is_some_and(|devs| devs.contains(&addr))
            })
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Delays
// ───────────────────────────────────────────────────────────────

/// Recording delay — no time passes, every pause is remembered.
pub struct SimDelay {
    pauses_ns: Vec<u64>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self { pauses_ns: Vec::new() }
    }

    /// Recorded pauses, truncated to whole milliseconds.
    pub fn pauses_ms(&self) -> Vec<u32> {
        self.pauses_ns.iter().map(|ns| (ns / 1_000_000) as u32).collect()
    }

    /// Total recorded pause time.
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.pauses_ns.iter().sum())
    }
}

impl Default for SimDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pauses_ns.push(u64::from(ns));
    }
}

/// Real blocking delay for the demo binary and hardware builds.
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

// ───────────────────────────────────────────────────────────────
// SimSurface
// ───────────────────────────────────────────────────────────────

/// One recorded frame-surface operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Init,
    Clear,
    Text { x: i32, y: i32, text: String, font: FontSize },
    CenteredText { y: i32, text: String, font: FontSize },
    ProgressBar { value: f32, max: f32 },
    Push,
}

/// Recording frame surface standing in for one 128×32 display.
pub struct SimSurface {
    pub ops: Vec<SurfaceOp>,
    pub push_count: usize,
    /// When set, `init` fails with `InitFailed`.
    pub fail_init: bool,
    /// When set, `push` fails with `PushFailed`.
    pub fail_pushes: bool,
}

impl SimSurface {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            push_count: 0,
            fail_init: false,
            fail_pushes: false,
        }
    }

    /// True if `needle` appeared in any drawn text so far.
    pub fn saw_text(&self, needle: &str) -> bool {
        self.ops.iter().any(|op| match op {
            SurfaceOp::Text { text, .. } | SurfaceOp::CenteredText { text, .. } => {
                text.contains(needle)
            }
            _ => false,
        })
    }

    /// Text drawn since the most recent `Clear`, in draw order.
    pub fn current_frame(&self) -> Vec<&str> {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, SurfaceOp::Clear))
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Text { text, .. } | SurfaceOp::CenteredText { text, .. } => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for SimSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSurface for SimSurface {
    fn init(&mut self) -> Result<(), DisplayError> {
        if self.fail_init {
            return Err(DisplayError::InitFailed);
        }
        self.ops.push(SurfaceOp::Init);
        Ok(())
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize) {
        self.ops.push(SurfaceOp::Text { x, y, text: text.to_owned(), font });
    }

    fn draw_text_centered(&mut self, y: i32, text: &str, font: FontSize) {
        self.ops.push(SurfaceOp::CenteredText { y, text: text.to_owned(), font });
    }

    fn draw_progress_bar(&mut self, _x: i32, _y: i32, _w: u32, _h: u32, value: f32, max: f32) {
        self.ops.push(SurfaceOp::ProgressBar { value, max });
    }

    fn push(&mut self) -> Result<(), DisplayError> {
        if self.fail_pushes {
            return Err(DisplayError::PushFailed);
        }
        self.ops.push(SurfaceOp::Push);
        self.push_count += 1;
        Ok(())
    }
}
