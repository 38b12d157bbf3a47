//! Collapses host pointer events into [`CanonicalPointerEvent`]s.
//!
//! Button inference is asymmetric. A release reports the button that started
//! the press, because the live bitmask has already dropped it by the time the
//! release is delivered. Every other kind reads the live bitmask and reports a
//! single button, checked in the order Left, Center, Right.
//!
//! ```
//! use rasterpanel::geometry::{LogicalPoint, LogicalSize, ScaleFactor};
//! use rasterpanel::input::{HostPointerEvent, InputNormalizer, Modifiers, MouseButton, NormalizedInput};
//!
//! let normalizer = InputNormalizer::new(LogicalSize::new(200.0, 100.0));
//! let tap = HostPointerEvent::Tapped { position: LogicalPoint::new(40.0, 30.0), modifiers: Modifiers::empty() };
//!
//! match normalizer.normalize(&tap, ScaleFactor::IDENTITY, 0) {
//!     NormalizedInput::Click(e) => {
//!         assert_eq!(e.button, MouseButton::Left);
//!         assert_eq!(e.fraction, (0.2, 0.3));
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use crate::geometry::{to_fraction, to_physical_point, LogicalPoint, LogicalSize, ScaleFactor};
use crate::input::types::{CanonicalPointerEvent, InputController, Modifiers, MouseButton, PointerSample};
use crate::input::HostPointerEvent;

/// A host event translated into its controller call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedInput {
    Enter,
    Leave,
    Move(CanonicalPointerEvent),
    Down(CanonicalPointerEvent),
    Up(CanonicalPointerEvent),
    Wheel(CanonicalPointerEvent),
    Click(CanonicalPointerEvent),
    DoubleClick(CanonicalPointerEvent),
}

impl NormalizedInput {
    /// The canonical event, if this kind carries one.
    pub fn event(&self) -> Option<&CanonicalPointerEvent> {
        match self {
            NormalizedInput::Enter | NormalizedInput::Leave => None,
            NormalizedInput::Move(e)
            | NormalizedInput::Down(e)
            | NormalizedInput::Up(e)
            | NormalizedInput::Wheel(e)
            | NormalizedInput::Click(e)
            | NormalizedInput::DoubleClick(e) => Some(e),
        }
    }

    /// Forwards to the matching controller callback.
    pub fn dispatch(&self, controller: &mut dyn InputController) {
        match self {
            NormalizedInput::Enter => controller.on_mouse_enter(),
            NormalizedInput::Leave => controller.on_mouse_leave(),
            NormalizedInput::Move(e) => controller.on_mouse_move(e),
            NormalizedInput::Down(e) => controller.on_mouse_down(e),
            NormalizedInput::Up(e) => controller.on_mouse_up(e),
            NormalizedInput::Wheel(e) => controller.on_mouse_wheel(e),
            NormalizedInput::Click(e) => controller.on_mouse_click(e),
            NormalizedInput::DoubleClick(e) => controller.on_mouse_double_click(e),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InputNormalizer {
    /// Logical bounds of the control, used for fractional positions
    bounds: LogicalSize,
}

impl InputNormalizer {
    pub fn new(bounds: LogicalSize) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> LogicalSize {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: LogicalSize) {
        self.bounds = bounds;
    }

    /// Translates `event`. `scale` must be the host scale at the time of the
    /// event; it is not cached.
    pub fn normalize(&self, event: &HostPointerEvent, scale: ScaleFactor, time_ms: i64) -> NormalizedInput {
        match *event {
            HostPointerEvent::Entered => NormalizedInput::Enter,
            HostPointerEvent::Exited => NormalizedInput::Leave,
            HostPointerEvent::Moved(sample) => {
                NormalizedInput::Move(self.from_sample(&sample, sample.buttons.primary(), scale, time_ms))
            }
            HostPointerEvent::Pressed(sample) => {
                NormalizedInput::Down(self.from_sample(&sample, sample.buttons.primary(), scale, time_ms))
            }
            HostPointerEvent::Released { sample, initial_button } => {
                NormalizedInput::Up(self.from_sample(&sample, initial_button.primary(), scale, time_ms))
            }
            HostPointerEvent::Wheel { sample, delta_y, .. } => {
                let mut e = self.from_sample(&sample, MouseButton::None, scale, time_ms);
                e.wheel_delta = Some(round_delta(delta_y));
                NormalizedInput::Wheel(e)
            }
            HostPointerEvent::Tapped { position, modifiers } => {
                let mut e = self.canonical(position, modifiers, MouseButton::Left, scale, time_ms);
                e.clicks = 1;
                NormalizedInput::Click(e)
            }
            HostPointerEvent::DoubleTapped { position, modifiers } => {
                let mut e = self.canonical(position, modifiers, MouseButton::Left, scale, time_ms);
                e.clicks = 2;
                NormalizedInput::DoubleClick(e)
            }
        }
    }

    fn from_sample(&self, sample: &PointerSample, button: MouseButton, scale: ScaleFactor, time_ms: i64) -> CanonicalPointerEvent {
        self.canonical(sample.position, sample.modifiers, button, scale, time_ms)
    }

    fn canonical(
        &self,
        position: LogicalPoint,
        modifiers: Modifiers,
        button: MouseButton,
        scale: ScaleFactor,
        time_ms: i64,
    ) -> CanonicalPointerEvent {
        CanonicalPointerEvent {
            position: to_physical_point(position, scale),
            fraction: to_fraction(position, self.bounds),
            modifiers: modifiers & (Modifiers::SHIFT | Modifiers::ALT | Modifiers::CONTROL),
            button,
            clicks: 0,
            wheel_delta: None,
            time_ms,
        }
    }
}

fn round_delta(delta: f64) -> i32 {
    // `as` saturates and maps NaN to zero
    delta.round() as i32
}
