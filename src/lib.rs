//! PLTN panel — multiplexed display synchronization engine.
//!
//! Nine monochrome displays share one I2C address behind two chained
//! channel-expander chips on a single wire pair.  This crate arbitrates the
//! chips so the displays can be addressed without collision, decouples the
//! fast control state from the slow act of pushing pixels, and turns raw
//! process state into short operator instructions:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │   LinuxI2cBus / SimBus    OledSurface / SimSurface           │
//! │   (BusPort)               (FrameSurface)                     │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │  MuxPair ── ChannelArbiter ×2   (bus exclusivity)  │      │
//! │  │  DisplayOrchestrator ── ValueInterpolator ×5       │      │
//! │  │                      └─ GuidanceEngine             │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is single-threaded and blocking by design: the owning
//! application calls `DisplayOrchestrator::update_all` once per control
//! tick, and a display failure is never allowed to stop the loop that
//! operates pumps and rods.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod diagnostics;
pub mod display;
pub mod error;
pub mod mux;
pub mod ports;
pub mod state;

pub use config::PanelConfig;
pub use display::{DisplayOrchestrator, SlotId, ValueInterpolator};
pub use mux::{ChannelArbiter, MuxPair};
pub use state::ProcessSnapshot;
