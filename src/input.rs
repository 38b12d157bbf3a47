//! Pointer input: host event shapes, the canonical event model and the
//! normalizer translating one into the other.

pub mod clock;
pub mod normalizer;
pub mod tap;
pub mod types;
#[cfg(feature = "winit")]
pub mod winit;

pub use clock::LogicalClock;
pub use normalizer::{InputNormalizer, NormalizedInput};
pub use tap::TapTracker;
pub use types::*;

/// Input controller that records every call, in order.
#[derive(Debug, Default)]
pub struct InputRecorder {
    pub calls: Vec<(&'static str, Option<CanonicalPointerEvent>)>,
}

impl InputRecorder {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.calls.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn last(&self) -> Option<&CanonicalPointerEvent> {
        self.calls.iter().rev().find_map(|(_, e)| e.as_ref())
    }
}

impl InputController for InputRecorder {
    fn on_mouse_enter(&mut self) {
        self.calls.push(("enter", None));
    }

    fn on_mouse_leave(&mut self) {
        self.calls.push(("leave", None));
    }

    fn on_mouse_move(&mut self, event: &CanonicalPointerEvent) {
        self.calls.push(("move", Some(*event)));
    }

    fn on_mouse_down(&mut self, event: &CanonicalPointerEvent) {
        self.calls.push(("down", Some(*event)));
    }

    fn on_mouse_up(&mut self, event: &CanonicalPointerEvent) {
        self.calls.push(("up", Some(*event)));
    }

    fn on_mouse_wheel(&mut self, event: &CanonicalPointerEvent) {
        self.calls.push(("wheel", Some(*event)));
    }

    fn on_mouse_click(&mut self, event: &CanonicalPointerEvent) {
        self.calls.push(("click", Some(*event)));
    }

    fn on_mouse_double_click(&mut self, event: &CanonicalPointerEvent) {
        self.calls.push(("double_click", Some(*event)));
    }
}
