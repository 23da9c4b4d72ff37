//! Port traits — the hexagonal boundary between the display engine and the
//! physical bus / display controllers.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MuxPair / DisplayOrchestrator (domain)
//! ```
//!
//! Driven adapters (the real `/dev/i2c` bus, the SSD1306 controllers, and
//! their simulation counterparts) implement these traits.  The engine
//! consumes them via generics, so the multiplexing and synchronization logic
//! never touches hardware directly and every invariant is testable against
//! recording mocks.
//!
//! Delay is deliberately *not* a port of this crate: the engine takes any
//! [`embedded_hal::delay::DelayNs`] so settle pauses are observable in tests
//! and `thread::sleep`-backed in production.

use crate::error::{BusError, DisplayError};

// ───────────────────────────────────────────────────────────────
// Bus port (driven adapter: engine → shared I2C wire pair)
// ───────────────────────────────────────────────────────────────

/// Raw byte-level access to the shared bus.
///
/// Exactly two operations are needed: the one-hot channel-select write the
/// expander chips understand, and an address ack-probe used during startup
/// scans.  Implementations MUST NOT retry internally — the engine's next
/// tick is the retry policy.
pub trait BusPort {
    /// Write a single byte to `addr`.  Used for the exclusive
    /// channel-select command (one bit set = one channel exposed).
    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), BusError>;

    /// True if a device acknowledges at `addr` on the currently exposed
    /// channel.  Must not have side effects on the device.
    fn probe(&mut self, addr: u8) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Frame surface port (driven adapter: engine → display controller)
// ───────────────────────────────────────────────────────────────

/// Font selector for text drawing; concrete metrics live in the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    /// ~8 px — titles and footers.
    Small,
    /// ~10 px — body text.
    Regular,
    /// ~12 px bold — the headline value.
    Large,
}

/// One monochrome 128×32 frame surface.
///
/// The engine draws into an off-screen buffer and [`push`](Self::push)es it
/// in one transfer.  The controller command sequence behind `init`/`push`
/// belongs to the adapter; the engine only cares that a failed push reports
/// failure so its change-detection caches stay honest.
pub trait FrameSurface {
    /// Bring the controller out of reset and blank it.  The correct mux
    /// channel must already be selected.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Blank the off-screen buffer.
    fn clear(&mut self);

    /// Draw `text` with its top-left corner at (`x`, `y`).
    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize);

    /// Draw `text` horizontally centered at height `y`.
    fn draw_text_centered(&mut self, y: i32, text: &str, font: FontSize);

    /// Draw an outlined progress bar filled to `value` of `max`.
    fn draw_progress_bar(&mut self, x: i32, y: i32, w: u32, h: u32, value: f32, max: f32);

    /// Transfer the buffer to the controller.  The correct mux channel must
    /// already be selected.
    fn push(&mut self) -> Result<(), DisplayError>;
}
