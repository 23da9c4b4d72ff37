//! Display synchronization: interpolation, guidance, and orchestration.

pub mod guidance;
pub mod interp;
pub mod orchestrator;

pub use interp::ValueInterpolator;
pub use orchestrator::{DisplayOrchestrator, SlotId};
