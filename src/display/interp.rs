//! Per-quantity display value interpolation.
//!
//! A logical target (say, requested pressure) can change on every control
//! tick — as fast as every 10–50 ms under button input — but pushing a pixel
//! frame costs milliseconds of bus time across nine displays.  The
//! interpolator converts the jumpy target into a bounded-rate displayed
//! value, and its [`needs_update`](ValueInterpolator::needs_update) gate is
//! the *only* thing that decides whether a slot touches the bus this tick.
//!
//! Invariants:
//! - the displayed value moves monotonically toward the target and never
//!   overshoots it;
//! - once within half a display unit it snaps exactly to the target;
//! - `needs_update` fires exactly once per change of the rounded value.

use std::time::Instant;

/// Gap below which the value snaps exactly to the target (display units).
const SNAP_EPSILON: f32 = 0.5;

/// Sentinel guaranteeing the next `needs_update` fires.
const NEVER_DISPLAYED: i32 = i32::MIN;

/// Rate-limited interpolation toward a moving target.
pub struct ValueInterpolator {
    /// Quantity name for log lines.
    name: &'static str,
    /// Value currently shown (pre-rounding).
    current: f32,
    /// Logical target from the latest snapshot.
    target: f32,
    /// Maximum slew rate (display units per second).
    speed: f32,
    /// Rounded value last reported as pushed.
    last_displayed: i32,
    /// Previous advance timestamp; `None` until the first call.
    last_tick: Option<Instant>,
}

impl ValueInterpolator {
    pub fn new(name: &'static str, speed: f32) -> Self {
        Self {
            name,
            current: 0.0,
            target: 0.0,
            speed,
            last_displayed: NEVER_DISPLAYED,
            last_tick: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record a new logical target.  Triggers no bus activity by itself.
    pub fn set_target(&mut self, v: f32) {
        self.target = v;
    }

    /// Advance toward the target by wall-clock elapsed time and return the
    /// rounded displayed value.
    pub fn get_display_value(&mut self) -> i32 {
        self.advance(Instant::now())
    }

    /// Deterministic core of [`get_display_value`](Self::get_display_value):
    /// advance as of `now`.
    pub fn advance(&mut self, now: Instant) -> i32 {
        let elapsed = match self.last_tick {
            // Monotonic clock: a regressed `now` advances by zero.
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);

        let gap = self.target - self.current;
        if gap.abs() <= SNAP_EPSILON {
            self.current = self.target;
        } else {
            let step = self.speed * elapsed;
            self.current = if gap > 0.0 {
                (self.current + step).min(self.target)
            } else {
                (self.current - step).max(self.target)
            };
            if (self.target - self.current).abs() <= SNAP_EPSILON {
                self.current = self.target;
            }
        }

        self.current.round() as i32
    }

    /// True exactly when the rounded value differs from the last one pushed;
    /// records the new value as pushed.  The sole gate for bus writes.
    pub fn needs_update(&mut self) -> bool {
        let rounded = self.current.round() as i32;
        if rounded != self.last_displayed {
            self.last_displayed = rounded;
            true
        } else {
            false
        }
    }

    /// Jump instantly to `v` and force the next `needs_update` to fire —
    /// used after an emergency stop and when syncing a freshly initialized
    /// display to existing state.
    pub fn reset(&mut self, v: f32) {
        self.current = v;
        self.target = v;
        self.last_displayed = NEVER_DISPLAYED;
    }

    /// Roll the change gate back after a failed select/push so the missed
    /// frame is retried next tick.
    pub fn mark_stale(&mut self) {
        self.last_displayed = NEVER_DISPLAYED;
    }
}
