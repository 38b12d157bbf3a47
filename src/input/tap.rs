use crate::geometry::LogicalPoint;
use crate::input::types::Modifiers;
use crate::input::HostPointerEvent;

/// Synthesizes tap gestures from press/release pairs, for hosts that only
/// deliver raw pointer events.
///
/// A release within `slop` logical units of its press is a tap. A tap within
/// `double_tap_ms` and `slop` of the previous tap is reported as a double tap
/// instead, after which the sequence starts over.
#[derive(Debug, Clone)]
pub struct TapTracker {
    slop: f64,
    double_tap_ms: i64,
    pressed_at: Option<LogicalPoint>,
    last_tap: Option<(LogicalPoint, i64)>,
}

impl TapTracker {
    pub fn new(slop: f64, double_tap_ms: u64) -> Self {
        Self {
            slop,
            double_tap_ms: i64::try_from(double_tap_ms).unwrap_or(i64::MAX),
            pressed_at: None,
            last_tap: None,
        }
    }

    pub fn press(&mut self, position: LogicalPoint) {
        self.pressed_at = Some(position);
    }

    pub fn release(&mut self, position: LogicalPoint, modifiers: Modifiers, time_ms: i64) -> Option<HostPointerEvent> {
        let pressed_at = self.pressed_at.take()?;
        if pressed_at.distance(position) > self.slop {
            self.last_tap = None;
            return None;
        }

        let double = match self.last_tap {
            Some((at, t)) => time_ms.saturating_sub(t) <= self.double_tap_ms && at.distance(position) <= self.slop,
            None => false,
        };

        if double {
            self.last_tap = None;
            Some(HostPointerEvent::DoubleTapped { position, modifiers })
        } else {
            self.last_tap = Some((position, time_ms));
            Some(HostPointerEvent::Tapped { position, modifiers })
        }
    }

    /// Forgets a pending press, e.g. when the pointer leaves the control.
    pub fn cancel(&mut self) {
        self.pressed_at = None;
    }
}
