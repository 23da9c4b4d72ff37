//! Startup and runtime diagnostics.
//!
//! The panel degrades silently from the operator's point of view — a dead
//! display only shows up here, in the health summary handed to the
//! supervising application, and in the startup scan log.

use core::fmt;

use log::info;

use crate::display::SlotId;
use crate::mux::MuxScan;

/// Per-slot liveness snapshot, produced by
/// [`DisplayOrchestrator::health`](crate::display::DisplayOrchestrator::health).
#[derive(Debug, Clone)]
pub struct PanelHealth {
    pub slots: [(SlotId, bool); SlotId::COUNT],
}

impl PanelHealth {
    /// Number of live displays.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|(_, alive)| *alive).count()
    }

    /// True if every display is live.
    pub fn all_alive(&self) -> bool {
        self.active() == SlotId::COUNT
    }

    pub fn is_alive(&self, id: SlotId) -> bool {
        self.slots.iter().any(|(slot, alive)| *slot == id && *alive)
    }

    /// Slots that failed init, for the health report.
    pub fn dead_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots.iter().filter(|(_, alive)| !alive).map(|(id, _)| *id)
    }
}

impl fmt::Display for PanelHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} active", self.active(), SlotId::COUNT)
    }
}

/// Log the startup bus scan the way the commissioning checklist expects it.
pub fn log_scan(scan: &MuxScan) {
    info!("bus scan: {} device(s) total", scan.device_count());
    for (name, devices) in [("chip A", &scan.chip_a), ("chip B", &scan.chip_b)] {
        if devices.is_empty() {
            info!("  {name}: no devices");
            continue;
        }
        for (channel, addrs) in devices {
            info!("  {name} channel {channel}: {addrs:02x?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(dead: &[SlotId]) -> PanelHealth {
        PanelHealth {
            slots: SlotId::ALL.map(|id| (id, !dead.contains(&id))),
        }
    }

    #[test]
    fn summary_counts_active_slots() {
        let h = health(&[]);
        assert_eq!(h.active(), 9);
        assert!(h.all_alive());
        assert_eq!(h.to_string(), "9 of 9 active");
    }

    #[test]
    fn dead_slots_are_reported() {
        let h = health(&[SlotId::Power, SlotId::ShimRod]);
        assert_eq!(h.active(), 7);
        assert_eq!(h.to_string(), "7 of 9 active");
        assert!(!h.is_alive(SlotId::Power));
        assert!(h.is_alive(SlotId::Pressurizer));
        let dead: Vec<SlotId> = h.dead_slots().collect();
        assert_eq!(dead, vec![SlotId::ShimRod, SlotId::Power]);
    }
}
