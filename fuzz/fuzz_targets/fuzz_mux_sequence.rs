//! Fuzz target: `MuxPair` selection sequences
//!
//! Drives arbitrary select/close streams at the chip pair and checks the
//! bus-exclusivity invariants:
//! - no panics under any operation order;
//! - valid selects always succeed on a healthy bus, reserved/out-of-range
//!   indices are always rejected;
//! - every accepted write to a chip is a one-hot mask or all-off.
//!
//! cargo fuzz run fuzz_mux_sequence

#![no_main]

use libfuzzer_sys::fuzz_target;
use pltn_panel::adapters::sim::{SimBus, SimDelay};
use pltn_panel::{MuxPair, PanelConfig};

fuzz_target!(|data: &[u8]| {
    let cfg = PanelConfig::default();
    let mut mux = MuxPair::new(SimBus::new(), &cfg);
    let mut delay = SimDelay::new();

    for byte in data {
        match byte & 0x0F {
            op @ 0..=7 => {
                let ok = mux.select_display(&mut delay, op);
                assert_eq!(ok, (1..=7).contains(&op), "display index {op}");
            }
            op @ 8..=11 => {
                let idx = op - 8;
                let ok = mux.select_secondary(&mut delay, idx);
                assert_eq!(ok, idx <= 2, "secondary index {idx}");
            }
            12 => {
                assert!(mux.close());
            }
            _ => {}
        }
    }

    // Every accepted write was a one-hot mask or all-off.
    for w in &mux.bus().writes {
        assert!(
            w.value == 0 || w.value.count_ones() == 1,
            "non-exclusive mask 0x{:02X} reached the bus",
            w.value
        );
    }
});
