use crate::events::EventRelay;
use crate::geometry::{PixelPoint, PixelSize};
use crate::input::InputController;
use crate::render::backend::{ErasedSurface, Renderer};
use crate::render::render_list::Color;
use anyhow::Result;
use std::time::Duration;

/// Single point of contact with a renderer.
///
/// Owns the renderer and the pixel surface it paints into, and relays the
/// renderer's lifecycle events to subscribers without modifying them.
pub struct RenderDriver<R: Renderer> {
    renderer: R,
    surface: Box<dyn ErasedSurface>,
    relay: EventRelay,
}

impl<R: Renderer> RenderDriver<R> {
    /// Wraps `renderer`, creating its pixel surface at `size` (which may be empty).
    pub fn new(mut renderer: R, size: PixelSize) -> Result<Self> {
        let surface = renderer.create_surface(size)?;
        let relay = EventRelay::new();
        renderer.attach_events(relay.sender());

        log::debug!("driver created for renderer '{}' at {}", renderer.name(), size);

        Ok(Self { renderer, surface, relay })
    }

    pub fn name(&self) -> &str {
        self.renderer.name()
    }

    pub fn configure(&mut self) {
        self.renderer.configure();
    }

    /// Renders one frame into the pixel surface. Blocks until the renderer is done.
    pub fn render(&mut self) {
        let relay = &mut self.relay;
        self.renderer.render(self.surface.as_mut(), &mut |event| relay.emit(event));
    }

    /// Resizes the pixel surface; does nothing when the size is unchanged.
    pub fn resize(&mut self, size: PixelSize) -> Result<()> {
        let current = self.surface.size();
        if current == size {
            return Ok(());
        }

        log::debug!("resizing pixel surface of '{}' from {} to {}", self.renderer.name(), current, size);
        self.surface.resize(size)
    }

    pub fn size(&self) -> PixelSize {
        self.surface.size()
    }

    pub fn pick(&mut self, point: PixelPoint, time_ms: i64) -> Option<u32> {
        self.renderer.pick(self.surface.as_ref(), point, time_ms)
    }

    pub fn back_color(&self) -> Color {
        self.renderer.back_color()
    }

    pub fn set_back_color(&mut self, color: Color) {
        self.renderer.set_back_color(color);
    }

    pub fn scene(&self) -> &R::Scene {
        self.renderer.scene()
    }

    pub fn scene_mut(&mut self) -> &mut R::Scene {
        self.renderer.scene_mut()
    }

    pub fn set_scene(&mut self, scene: R::Scene) {
        self.renderer.set_scene(scene);
    }

    pub fn fps(&self) -> u32 {
        self.renderer.fps()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.renderer.timeout()
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.renderer.set_timeout(timeout);
    }

    pub fn input_controller(&mut self) -> Option<&mut dyn InputController> {
        self.renderer.input_controller()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn surface(&self) -> &dyn ErasedSurface {
        self.surface.as_ref()
    }

    pub fn events_mut(&mut self) -> &mut EventRelay {
        &mut self.relay
    }

    /// Delivers events queued from other threads. Must be called on the UI thread.
    pub fn pump_events(&mut self) -> usize {
        self.relay.pump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DriverEventKind;
    use crate::render::backend::PixelFormat;
    use crate::render::backends::software::SoftwareRenderer;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn render_relays_events_unmodified() {
        let mut driver = RenderDriver::new(SoftwareRenderer::new(PixelFormat::Rgba8), PixelSize::new(8, 8)).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        driver.events_mut().subscribe(move |e| s.borrow_mut().push(e.kind()));

        driver.configure();
        driver.render();
        driver.render();

        assert_eq!(
            *seen.borrow(),
            vec![
                DriverEventKind::FrameBegin,
                DriverEventKind::FrameEnd,
                DriverEventKind::FrameBegin,
                DriverEventKind::FrameEnd
            ]
        );
    }

    #[test]
    fn resize_is_noop_when_unchanged() {
        let mut driver = RenderDriver::new(SoftwareRenderer::new(PixelFormat::Rgba8), PixelSize::new(8, 8)).unwrap();
        driver.resize(PixelSize::new(8, 8)).unwrap();
        assert_eq!(driver.size(), PixelSize::new(8, 8));

        driver.resize(PixelSize::new(16, 4)).unwrap();
        assert_eq!(driver.size(), PixelSize::new(16, 4));
    }

    #[test]
    fn scene_and_back_color_pass_through() {
        let mut driver = RenderDriver::new(SoftwareRenderer::new(PixelFormat::Rgba8), PixelSize::ZERO).unwrap();
        driver.set_back_color(Color::BLACK);
        assert_eq!(driver.back_color(), Color::BLACK);
        assert!(driver.scene().items.is_empty());
        driver.scene_mut().clear();
        assert_eq!(driver.name(), "SoftwareRenderer");
    }
}
