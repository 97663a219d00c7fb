//! Dial gesture interpretation — rotation deltas and press debouncing.
//!
//! Hosts differ in how they encode a dial turn: an integer tick count, a
//! numeric rotation, or a direction word. Some also deliver a spurious
//! "dial down" right after a turn, sometimes carrying rotation fields.
//! [`extract_delta`] and [`DialGesture`] keep that interpretation in one
//! place, free of any I/O.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::settings::coerce_int;

/// A press this soon after a rotation is treated as part of the rotation.
pub const PRESS_DEBOUNCE: Duration = Duration::from_millis(350);

/// Integer tick fields, checked first.
const TICK_KEYS: [&str; 2] = ["ticks", "delta"];
/// Numeric or direction-word fields, checked second.
const ROTATION_KEYS: [&str; 2] = ["rotation", "dialRotation"];

/// Signed rotation step count from a dial event payload. `0` means "no turn".
pub fn extract_delta(payload: &Value) -> i64 {
    let Some(obj) = payload.as_object() else {
        return 0;
    };
    for key in TICK_KEYS {
        if let Some(v) = obj.get(key) {
            // Present but unusable still ends the search.
            return coerce_int(v).unwrap_or(0);
        }
    }
    for key in ROTATION_KEYS {
        match obj.get(key) {
            Some(v @ Value::Number(_)) => return coerce_int(v).unwrap_or(0),
            Some(Value::String(s)) => {
                if let Some(d) = direction_word(s) {
                    return d;
                }
            }
            _ => {}
        }
    }
    0
}

fn direction_word(word: &str) -> Option<i64> {
    let w = word.trim().to_lowercase();
    if w.starts_with("counter") || w.starts_with("anti") || w.starts_with("ccw") || w.starts_with('a')
    {
        return Some(-1);
    }
    if w.starts_with('c') || w.contains("right") {
        return Some(1);
    }
    if w.contains("left") {
        return Some(-1);
    }
    None
}

/// Whether a payload carries any rotation field, whatever its value.
pub fn looks_like_rotation(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|obj| TICK_KEYS.iter().chain(&ROTATION_KEYS).any(|k| obj.contains_key(*k)))
}

/// Why a dial press was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressSuppression {
    /// Arrived within [`PRESS_DEBOUNCE`] of a rotation.
    NearRotation,
    /// The payload itself is rotation-shaped.
    RotationPayload,
}

/// Tracks the last rotation so a following press can be classified.
#[derive(Debug, Clone, Default)]
pub struct DialGesture {
    last_rotation: Option<Instant>,
}

impl DialGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rotation event at `now`.
    pub fn record_rotation(&mut self, now: Instant) {
        self.last_rotation = Some(now);
    }

    /// Classify a press at `now`. `None` means it is a genuine press.
    pub fn classify_press(&self, payload: &Value, now: Instant) -> Option<PressSuppression> {
        if let Some(last) = self.last_rotation
            && now.saturating_duration_since(last) < PRESS_DEBOUNCE
        {
            return Some(PressSuppression::NearRotation);
        }
        if looks_like_rotation(payload) {
            return Some(PressSuppression::RotationPayload);
        }
        None
    }
}
