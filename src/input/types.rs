//! Input event types.
//!
//! - [`HostPointerEvent`]: pointer/tap events as a host delivers them.
//! - [`CanonicalPointerEvent`]: the single event model handed to an [`InputController`].
//! - [`MouseButton`], [`PointerButtons`], [`Modifiers`]: button and modifier state.

use crate::geometry::{LogicalPoint, PixelPoint};
use bitflags::bitflags;
use std::fmt::Display;

/// The one button a canonical event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// No button involved (plain moves, wheel)
    None,
    /// Left (primary) button
    Left,
    /// Middle button / wheel click
    Center,
    /// Right (secondary) button
    Right,
}

impl Default for MouseButton {
    fn default() -> Self {
        MouseButton::None
    }
}

impl Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MouseButton::None => write!(f, "None"),
            MouseButton::Left => write!(f, "Left"),
            MouseButton::Center => write!(f, "Center"),
            MouseButton::Right => write!(f, "Right"),
        }
    }
}

bitflags! {
    /// Buttons a host reports as pressed.
    pub struct PointerButtons: u8 {
        const LEFT   = 0b001;
        const MIDDLE = 0b010;
        const RIGHT  = 0b100;
    }
}

impl PointerButtons {
    /// The single reported button, in priority order Left, Center, Right.
    pub fn primary(&self) -> MouseButton {
        if self.contains(PointerButtons::LEFT) {
            MouseButton::Left
        } else if self.contains(PointerButtons::MIDDLE) {
            MouseButton::Center
        } else if self.contains(PointerButtons::RIGHT) {
            MouseButton::Right
        } else {
            MouseButton::None
        }
    }
}

impl From<MouseButton> for PointerButtons {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::None => PointerButtons::empty(),
            MouseButton::Left => PointerButtons::LEFT,
            MouseButton::Center => PointerButtons::MIDDLE,
            MouseButton::Right => PointerButtons::RIGHT,
        }
    }
}

bitflags! {
    pub struct Modifiers: u8 {
        const SHIFT   = 0b0001;
        const CONTROL = 0b0010;
        const ALT     = 0b0100;
        const META    = 0b1000;
    }
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if self.contains(Modifiers::SHIFT) {
            parts.push("Shift");
        }
        if self.contains(Modifiers::CONTROL) {
            parts.push("Control");
        }
        if self.contains(Modifiers::ALT) {
            parts.push("Alt");
        }
        if self.contains(Modifiers::META) {
            parts.push("Meta");
        }

        if parts.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// Pointer state sampled by the host together with an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Position relative to the control, in logical units
    pub position: LogicalPoint,
    pub modifiers: Modifiers,
    /// Buttons pressed at the time of the event
    pub buttons: PointerButtons,
}

impl PointerSample {
    pub fn new(position: LogicalPoint, modifiers: Modifiers, buttons: PointerButtons) -> Self {
        Self { position, modifiers, buttons }
    }

    /// A sample with no modifiers and no buttons pressed.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(LogicalPoint::new(x, y), Modifiers::empty(), PointerButtons::empty())
    }
}

/// Pointer input as delivered by a host framework.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostPointerEvent {
    /// Pointer entered the control
    Entered,
    /// Pointer left the control
    Exited,
    /// Pointer moved
    Moved(PointerSample),
    /// A button was pressed
    Pressed(PointerSample),
    /// A button was released. The live bitmask in `sample` no longer contains
    /// the released button; `initial_button` holds the button that started the
    /// press.
    Released { sample: PointerSample, initial_button: PointerButtons },
    /// Wheel scrolled; deltas are in host wheel units (usually lines)
    Wheel { sample: PointerSample, delta_x: f64, delta_y: f64 },
    /// Single tap/click gesture
    Tapped { position: LogicalPoint, modifiers: Modifiers },
    /// Double tap/click gesture
    DoubleTapped { position: LogicalPoint, modifiers: Modifiers },
}

/// The canonical pointer event consumed by an [`InputController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalPointerEvent {
    /// Position in physical pixels
    pub position: PixelPoint,
    /// Position as a fraction of the control's logical bounds, each in `[0, 1]`
    pub fraction: (f32, f32),
    /// Shift, Control and Alt only
    pub modifiers: Modifiers,
    pub button: MouseButton,
    pub clicks: u32,
    /// Vertical wheel delta, wheel events only
    pub wheel_delta: Option<i32>,
    pub time_ms: i64,
}

impl CanonicalPointerEvent {
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CONTROL)
    }
}

/// The renderer-side consumer of normalized input.
pub trait InputController {
    fn on_mouse_enter(&mut self);
    fn on_mouse_leave(&mut self);
    fn on_mouse_move(&mut self, event: &CanonicalPointerEvent);
    fn on_mouse_down(&mut self, event: &CanonicalPointerEvent);
    fn on_mouse_up(&mut self, event: &CanonicalPointerEvent);
    fn on_mouse_wheel(&mut self, event: &CanonicalPointerEvent);
    fn on_mouse_click(&mut self, event: &CanonicalPointerEvent);
    fn on_mouse_double_click(&mut self, event: &CanonicalPointerEvent);
}
