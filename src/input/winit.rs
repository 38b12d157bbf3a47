use crate::geometry::LogicalPoint;
use crate::input::tap::TapTracker;
use crate::input::types::{Modifiers, PointerButtons, PointerSample};
use crate::input::HostPointerEvent;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::ModifiersState;

/// Pixels per wheel line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f64 = 40.0;

/// Translates winit window events into [`HostPointerEvent`]s.
///
/// winit reports button transitions one at a time, so the adapter tracks the
/// pressed bitmask, the button that started the current press, the modifier
/// state and the last cursor position itself. Positions are converted from
/// physical to logical with the window's scale factor. Taps are synthesized
/// with a [`TapTracker`].
pub struct WinitPointerAdapter {
    scale_factor: f64,
    position: LogicalPoint,
    buttons: PointerButtons,
    initial_button: PointerButtons,
    modifiers: Modifiers,
    taps: TapTracker,
}

impl WinitPointerAdapter {
    pub fn new(scale_factor: f64, taps: TapTracker) -> Self {
        Self {
            scale_factor,
            position: LogicalPoint::default(),
            buttons: PointerButtons::empty(),
            initial_button: PointerButtons::empty(),
            modifiers: Modifiers::empty(),
            taps,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Translates one window event. Events that are not pointer related
    /// produce nothing.
    pub fn translate(&mut self, event: &WindowEvent, time_ms: i64) -> Vec<HostPointerEvent> {
        match event {
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
                vec![]
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.set_modifiers(modifiers.state());
                vec![]
            }
            WindowEvent::CursorEntered { .. } => vec![HostPointerEvent::Entered],
            WindowEvent::CursorLeft { .. } => {
                self.taps.cancel();
                vec![HostPointerEvent::Exited]
            }
            WindowEvent::CursorMoved { position, .. } => vec![self.cursor_moved(position.x, position.y)],
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(flag) = button_flag(*button) else {
                    log::trace!("ignoring mouse button {button:?}");
                    return vec![];
                };
                self.mouse_input(flag, *state == ElementState::Pressed, time_ms)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (f64::from(*x), f64::from(*y)),
                    MouseScrollDelta::PixelDelta(p) => (p.x / PIXELS_PER_LINE, p.y / PIXELS_PER_LINE),
                };
                vec![self.wheel(dx, dy)]
            }
            _ => vec![],
        }
    }

    pub fn set_modifiers(&mut self, state: ModifiersState) {
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, state.shift_key());
        modifiers.set(Modifiers::CONTROL, state.control_key());
        modifiers.set(Modifiers::ALT, state.alt_key());
        modifiers.set(Modifiers::META, state.super_key());
        self.modifiers = modifiers;
    }

    /// Cursor moved to the physical position `(x, y)`.
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> HostPointerEvent {
        let scale = if self.scale_factor.is_finite() && self.scale_factor > 0.0 { self.scale_factor } else { 1.0 };
        self.position = LogicalPoint::new(x / scale, y / scale);
        HostPointerEvent::Moved(self.sample())
    }

    /// A button changed state at the last known position.
    pub fn mouse_input(&mut self, button: PointerButtons, pressed: bool, time_ms: i64) -> Vec<HostPointerEvent> {
        if pressed {
            if self.buttons.is_empty() {
                self.initial_button = button;
                if button == PointerButtons::LEFT {
                    self.taps.press(self.position);
                }
            }
            self.buttons.insert(button);
            return vec![HostPointerEvent::Pressed(self.sample())];
        }

        if !self.buttons.contains(button) {
            // release of a press that started outside the window
            return vec![];
        }
        self.buttons.remove(button);

        let initial_button = if self.initial_button.is_empty() { button } else { self.initial_button };
        let mut events = vec![HostPointerEvent::Released { sample: self.sample(), initial_button }];

        if self.buttons.is_empty() {
            self.initial_button = PointerButtons::empty();
            if button == PointerButtons::LEFT {
                events.extend(self.taps.release(self.position, self.modifiers, time_ms));
            }
        }
        events
    }

    pub fn wheel(&mut self, delta_x: f64, delta_y: f64) -> HostPointerEvent {
        HostPointerEvent::Wheel { sample: self.sample(), delta_x, delta_y }
    }

    fn sample(&self) -> PointerSample {
        PointerSample::new(self.position, self.modifiers, self.buttons)
    }
}

fn button_flag(button: winit::event::MouseButton) -> Option<PointerButtons> {
    match button {
        winit::event::MouseButton::Left => Some(PointerButtons::LEFT),
        winit::event::MouseButton::Middle => Some(PointerButtons::MIDDLE),
        winit::event::MouseButton::Right => Some(PointerButtons::RIGHT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(scale: f64) -> WinitPointerAdapter {
        WinitPointerAdapter::new(scale, TapTracker::new(4.0, 500))
    }

    #[test]
    fn cursor_position_is_logical() {
        let mut a = adapter(2.0);
        match a.cursor_moved(100.0, 50.0) {
            HostPointerEvent::Moved(s) => assert_eq!(s.position, LogicalPoint::new(50.0, 25.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn release_carries_initial_button() {
        let mut a = adapter(1.0);
        a.cursor_moved(10.0, 10.0);
        a.mouse_input(PointerButtons::RIGHT, true, 0);
        a.mouse_input(PointerButtons::LEFT, true, 1);

        let events = a.mouse_input(PointerButtons::LEFT, false, 2);
        assert_eq!(
            events[0],
            HostPointerEvent::Released {
                sample: PointerSample::new(LogicalPoint::new(10.0, 10.0), Modifiers::empty(), PointerButtons::RIGHT),
                initial_button: PointerButtons::RIGHT,
            }
        );

        let events = a.mouse_input(PointerButtons::RIGHT, false, 3);
        match events.as_slice() {
            [HostPointerEvent::Released { sample, initial_button }] => {
                assert!(sample.buttons.is_empty());
                assert_eq!(*initial_button, PointerButtons::RIGHT);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn left_click_synthesizes_taps() {
        let mut a = adapter(1.0);
        a.cursor_moved(20.0, 20.0);

        a.mouse_input(PointerButtons::LEFT, true, 0);
        let first = a.mouse_input(PointerButtons::LEFT, false, 50);
        assert!(matches!(first.as_slice(), [HostPointerEvent::Released { .. }, HostPointerEvent::Tapped { .. }]));

        a.mouse_input(PointerButtons::LEFT, true, 100);
        let second = a.mouse_input(PointerButtons::LEFT, false, 150);
        assert!(matches!(second.as_slice(), [HostPointerEvent::Released { .. }, HostPointerEvent::DoubleTapped { .. }]));
    }

    #[test]
    fn stray_release_is_dropped() {
        let mut a = adapter(1.0);
        assert!(a.mouse_input(PointerButtons::LEFT, false, 0).is_empty());
    }

    #[test]
    fn modifiers_follow_keyboard_state() {
        let mut a = adapter(1.0);
        a.set_modifiers(ModifiersState::SHIFT | ModifiersState::SUPER);
        match a.wheel(0.0, -1.0) {
            HostPointerEvent::Wheel { sample, delta_y, .. } => {
                assert_eq!(sample.modifiers, Modifiers::SHIFT | Modifiers::META);
                assert_eq!(delta_y, -1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
