//! Unified error types for the panel display engine.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the control loop's error handling uniform.
//! All variants are `Copy` so they can be cheaply logged and discarded on the
//! display hot path without allocation.
//!
//! Note that the hot path itself (`select` / `update_all`) reports failure as
//! `bool` and logs — a display glitch must never become an unhandled fault in
//! the loop that operates pumps and rods.  These types exist for the
//! lifecycle edges (init, scan, adapter construction) where the caller wants
//! to know *why*.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level panel error
// ---------------------------------------------------------------------------

/// Every fallible operation in the display engine funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus transaction failed or a channel index was out of range.
    Bus(BusError),
    /// A display controller could not be driven.
    Display(DisplayError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The addressed device did not acknowledge the transaction.
    Nack,
    /// The transaction did not complete within the bus timeout.
    Timeout,
    /// Channel index outside 0–7 (caller bug, not a hardware fault).
    InvalidChannel,
    /// Generic I/O error from the bus backend.
    Io,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledgment"),
            Self::Timeout => write!(f, "transaction timeout"),
            Self::InvalidChannel => write!(f, "channel index out of range"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// Controller never responded during the bounded startup probe.
    ProbeTimeout,
    /// Controller init command sequence failed.
    InitFailed,
    /// Frame push to the controller failed mid-transfer.
    PushFailed,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeTimeout => write!(f, "probe timeout"),
            Self::InitFailed => write!(f, "controller init failed"),
            Self::PushFailed => write!(f, "frame push failed"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
