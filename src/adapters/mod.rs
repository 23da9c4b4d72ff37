//! Adapters — concrete implementations of the port traits.
//!
//! `sim` is always compiled: it backs the test suite and the demo binary.
//! `oled` is the real Raspberry Pi stack (`/dev/i2c` + SSD1306), gated
//! behind the `hw` feature.

pub mod sim;

#[cfg(feature = "hw")]
pub mod oled;
