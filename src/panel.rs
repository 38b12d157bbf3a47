//! The embeddable surface control.
//!
//! A [`RasterPanel`] sits between a host UI framework and a [`Renderer`]. The
//! host tells it about size changes, asks it to paint into a drawing context
//! and feeds it pointer events. The panel keeps the renderer's pixel surface in
//! step with the control's physical size, copies each rendered frame into a
//! host bitmap and forwards normalized input to the renderer's input
//! controller.
//!
//! The panel goes through three states:
//!
//! - `Detached`: the control has no paintable area (not laid out yet, or
//!   collapsed to zero on an axis). Painting does nothing until the bounds
//!   become paintable at the host's current scale.
//! - `Ready`: the pixel surface matches the control and frames are published.
//! - `Disposed`: resources have been released. Everything becomes a no-op and
//!   driver accessors return [`BridgeError::Disposed`].
//!
//! # Example
//!
//! ```
//! use rasterpanel::config::PanelConfig;
//! use rasterpanel::geometry::LogicalSize;
//! use rasterpanel::panel::{PanelState, RasterPanel};
//! use rasterpanel::present::memory::{MemoryHost, RecordingCanvas};
//! use rasterpanel::render::backend::PixelFormat;
//! use rasterpanel::render::backends::software::SoftwareRenderer;
//! # fn main() -> Result<(), rasterpanel::errors::BridgeError> {
//! let renderer = SoftwareRenderer::new(PixelFormat::Bgra8);
//! let mut panel = RasterPanel::new(renderer, MemoryHost::new(1.5), PanelConfig::default())?;
//!
//! panel.on_size_changed(LogicalSize::new(200.0, 100.0))?;
//! assert_eq!(panel.state(), PanelState::Ready);
//!
//! let mut canvas = RecordingCanvas::default();
//! panel.paint(&mut canvas)?;
//! assert_eq!(canvas.last().unwrap().dest.width, 300);
//! # Ok(()) }
//! ```

use crate::config::PanelConfig;
use crate::errors::BridgeError;
use crate::events::EventRelay;
use crate::geometry::{to_physical, to_physical_point, LogicalPoint, LogicalSize, PixelSize, ScaleFactor};
use crate::input::{HostPointerEvent, InputController, InputNormalizer, LogicalClock};
use crate::present::{DrawingContext, PresentationHost, PresentationStats, PresentationSurface};
use crate::render::backend::{ErasedSurface, Renderer, RgbaImage};
use crate::render::driver::RenderDriver;
use crate::render::render_list::Color;
use crate::render::surface::PackedPixelSurface;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(Uuid);

impl PanelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// No paintable area
    Detached,
    /// Pixel surface sized to the control
    Ready,
    /// Resources released
    Disposed,
}

pub struct RasterPanel<R: Renderer, H: PresentationHost> {
    id: PanelId,
    config: PanelConfig,
    state: PanelState,
    host: H,
    driver: Option<RenderDriver<R>>,
    presenter: PresentationSurface<H::Bitmap>,
    normalizer: InputNormalizer,
    clock: LogicalClock,
    /// Overrides the renderer's own input controller when set
    controller: Option<Box<dyn InputController>>,
}

impl<R: Renderer, H: PresentationHost> RasterPanel<R, H> {
    /// Creates a detached panel. The renderer's pixel surface starts empty and
    /// is sized by the first [`RasterPanel::on_size_changed`].
    pub fn new(renderer: R, host: H, config: PanelConfig) -> Result<Self, BridgeError> {
        config.validate()?;

        let driver = RenderDriver::new(renderer, PixelSize::ZERO).map_err(BridgeError::Driver)?;
        let id = PanelId::new();
        log::debug!("Panel[{}]: created for renderer '{}'", id, driver.name());

        Ok(Self {
            id,
            state: PanelState::Detached,
            host,
            driver: Some(driver),
            presenter: PresentationSurface::new(config.reference_dpi),
            normalizer: InputNormalizer::new(LogicalSize::default()),
            clock: LogicalClock::new(config.clock_running),
            controller: None,
            config,
        })
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Logical bounds last reported by the host.
    pub fn bounds(&self) -> LogicalSize {
        self.normalizer.bounds()
    }

    pub fn presentation_stats(&self) -> PresentationStats {
        self.presenter.stats()
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut LogicalClock {
        &mut self.clock
    }

    /// Host scale right now. Never cached; hosts may move between displays.
    fn scale(&self) -> ScaleFactor {
        ScaleFactor::or_fallback(self.host.scale_factor(), self.config.fallback_scale)
    }

    fn driver(&self) -> Result<&RenderDriver<R>, BridgeError> {
        self.driver.as_ref().ok_or(BridgeError::Disposed)
    }

    fn driver_mut(&mut self) -> Result<&mut RenderDriver<R>, BridgeError> {
        self.driver.as_mut().ok_or(BridgeError::Disposed)
    }

    /// The host resized the control.
    pub fn on_size_changed(&mut self, bounds: LogicalSize) -> Result<(), BridgeError> {
        if self.state == PanelState::Disposed {
            log::debug!("Panel[{}]: ignoring resize after dispose", self.id);
            return Ok(());
        }

        self.normalizer.set_bounds(bounds);

        let physical = to_physical(bounds, self.scale());
        if !physical.is_paintable() {
            log::debug!("Panel[{}]: {} is not paintable, detaching", self.id, physical);
            self.state = PanelState::Detached;
            return Ok(());
        }

        self.driver_mut()?.resize(physical).map_err(BridgeError::Driver)?;
        self.state = PanelState::Ready;
        self.host.request_repaint();
        Ok(())
    }

    /// Renders one frame and draws it into `canvas`.
    ///
    /// The physical size is recomputed from the current host scale, so a scale
    /// change that arrived without a size change still gets a correctly sized
    /// frame. The same applies in reverse: a detached panel whose bounds become
    /// paintable at the current scale is painted again.
    pub fn paint<C>(&mut self, canvas: &mut C) -> Result<(), BridgeError>
    where
        C: DrawingContext<H::Bitmap> + ?Sized,
    {
        if self.state == PanelState::Disposed {
            log::trace!("Panel[{}]: skipping paint after dispose", self.id);
            return Ok(());
        }

        let scale = self.scale();
        let physical = to_physical(self.normalizer.bounds(), scale);
        if !physical.is_paintable() {
            if self.state == PanelState::Ready {
                log::debug!("Panel[{}]: {} is not paintable at scale {}, detaching", self.id, physical, scale.get());
                self.state = PanelState::Detached;
            } else {
                log::trace!("Panel[{}]: skipping paint while detached", self.id);
            }
            return Ok(());
        }

        let driver = self.driver.as_mut().ok_or(BridgeError::Disposed)?;
        if driver.size() != physical {
            log::debug!("Panel[{}]: scale changed to {}, resizing to {}", self.id, scale.get(), physical);
            driver.resize(physical).map_err(BridgeError::Driver)?;
        }

        if self.state == PanelState::Detached {
            log::debug!("Panel[{}]: {} is paintable at scale {}, attaching", self.id, physical, scale.get());
            self.state = PanelState::Ready;
        }

        driver.configure();
        driver.render();
        self.presenter.publish(&mut self.host, driver.surface(), driver.name(), scale, canvas)
    }

    /// Normalizes `event` and forwards it to the input controller.
    pub fn handle_pointer(&mut self, event: &HostPointerEvent) {
        if self.state == PanelState::Disposed {
            return;
        }

        let input = self.normalizer.normalize(event, self.scale(), self.clock.time_ms());

        if let Some(controller) = self.controller.as_deref_mut() {
            input.dispatch(controller);
        } else if let Some(controller) = self.driver.as_mut().and_then(|d| d.input_controller()) {
            input.dispatch(controller);
        } else {
            log::debug!("Panel[{}]: no input controller, dropping {:?}", self.id, input);
        }
    }

    /// Routes input to `controller` instead of the renderer's own controller.
    /// Returns the previously attached controller.
    pub fn set_input_controller(&mut self, controller: Box<dyn InputController>) -> Option<Box<dyn InputController>> {
        self.controller.replace(controller)
    }

    pub fn take_input_controller(&mut self) -> Option<Box<dyn InputController>> {
        self.controller.take()
    }

    /// Listener registry for the renderer's events.
    pub fn events_mut(&mut self) -> Result<&mut EventRelay, BridgeError> {
        Ok(self.driver_mut()?.events_mut())
    }

    /// Delivers renderer events raised on other threads. Call from the UI thread.
    pub fn pump_events(&mut self) -> usize {
        self.driver.as_mut().map(|d| d.pump_events()).unwrap_or(0)
    }

    pub fn configure(&mut self) -> Result<(), BridgeError> {
        self.driver_mut()?.configure();
        Ok(())
    }

    /// Asks the host for a repaint.
    pub fn invalidate(&mut self) {
        if self.state != PanelState::Disposed {
            self.host.request_repaint();
        }
    }

    pub fn back_color(&self) -> Result<Color, BridgeError> {
        Ok(self.driver()?.back_color())
    }

    pub fn set_back_color(&mut self, color: Color) -> Result<(), BridgeError> {
        self.driver_mut()?.set_back_color(color);
        Ok(())
    }

    pub fn scene(&self) -> Result<&R::Scene, BridgeError> {
        Ok(self.driver()?.scene())
    }

    pub fn scene_mut(&mut self) -> Result<&mut R::Scene, BridgeError> {
        Ok(self.driver_mut()?.scene_mut())
    }

    pub fn set_scene(&mut self, scene: R::Scene) -> Result<(), BridgeError> {
        self.driver_mut()?.set_scene(scene);
        Ok(())
    }

    pub fn fps(&self) -> Result<u32, BridgeError> {
        Ok(self.driver()?.fps())
    }

    /// Physical size of the renderer's pixel surface.
    pub fn size(&self) -> Result<PixelSize, BridgeError> {
        Ok(self.driver()?.size())
    }

    /// Longest a frame may take before the renderer reports it as failed.
    pub fn timeout(&self) -> Result<Option<Duration>, BridgeError> {
        Ok(self.driver()?.timeout())
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), BridgeError> {
        self.driver_mut()?.set_timeout(timeout);
        Ok(())
    }

    pub fn renderer(&self) -> Result<&R, BridgeError> {
        Ok(self.driver()?.renderer())
    }

    pub fn renderer_mut(&mut self) -> Result<&mut R, BridgeError> {
        Ok(self.driver_mut()?.renderer_mut())
    }

    /// Object id under a point given in logical units.
    pub fn pick_at(&mut self, point: LogicalPoint) -> Result<Option<u32>, BridgeError> {
        let physical = to_physical_point(point, self.scale());
        let time_ms = self.clock.time_ms();
        Ok(self.driver_mut()?.pick(physical, time_ms))
    }

    /// RGBA copy of the last rendered frame. `None` when the renderer's
    /// surface holds no pixels.
    pub fn snapshot(&self) -> Result<Option<RgbaImage>, BridgeError> {
        let driver = self.driver()?;
        let Some(packed) = driver.surface().as_any().downcast_ref::<PackedPixelSurface>() else {
            return Ok(None);
        };

        let size = packed.size();
        if !size.is_paintable() {
            return Ok(None);
        }
        RgbaImage::from_packed(packed.pixels(), size, packed.format()).map(Some).map_err(BridgeError::Driver)
    }

    /// Releases the host bitmap and the renderer. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.state == PanelState::Disposed {
            return;
        }

        self.presenter.release(&mut self.host);
        self.driver = None;
        self.controller = None;
        self.clock.stop();
        self.state = PanelState::Disposed;
        log::debug!("Panel[{}]: disposed", self.id);
    }
}

impl<R: Renderer, H: PresentationHost> Drop for RasterPanel<R, H> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Dpi, PixelRect};
    use crate::input::{CanonicalPointerEvent, InputRecorder, Modifiers, MouseButton, PointerButtons, PointerSample};
    use crate::present::memory::{MemoryBitmap, MemoryHost, RecordingCanvas};
    use crate::render::backend::PixelFormat;
    use crate::render::backends::null::NullRenderer;
    use crate::render::backends::software::SoftwareRenderer;
    use crate::render::render_list::{DisplayItem, RenderList};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn software_panel(scale: f64) -> RasterPanel<SoftwareRenderer, MemoryHost> {
        RasterPanel::new(SoftwareRenderer::new(PixelFormat::Rgba8), MemoryHost::new(scale), PanelConfig::default()).unwrap()
    }

    struct SharedRecorder(Rc<RefCell<InputRecorder>>);

    impl InputController for SharedRecorder {
        fn on_mouse_enter(&mut self) {
            self.0.borrow_mut().on_mouse_enter()
        }
        fn on_mouse_leave(&mut self) {
            self.0.borrow_mut().on_mouse_leave()
        }
        fn on_mouse_move(&mut self, event: &CanonicalPointerEvent) {
            self.0.borrow_mut().on_mouse_move(event)
        }
        fn on_mouse_down(&mut self, event: &CanonicalPointerEvent) {
            self.0.borrow_mut().on_mouse_down(event)
        }
        fn on_mouse_up(&mut self, event: &CanonicalPointerEvent) {
            self.0.borrow_mut().on_mouse_up(event)
        }
        fn on_mouse_wheel(&mut self, event: &CanonicalPointerEvent) {
            self.0.borrow_mut().on_mouse_wheel(event)
        }
        fn on_mouse_click(&mut self, event: &CanonicalPointerEvent) {
            self.0.borrow_mut().on_mouse_click(event)
        }
        fn on_mouse_double_click(&mut self, event: &CanonicalPointerEvent) {
            self.0.borrow_mut().on_mouse_double_click(event)
        }
    }

    /// Memory host reporting releases through a shared counter, so they can be
    /// observed after the panel is gone.
    struct SharedHost {
        inner: MemoryHost,
        released: Rc<Cell<u64>>,
    }

    impl PresentationHost for SharedHost {
        type Bitmap = MemoryBitmap;

        fn scale_factor(&self) -> f64 {
            self.inner.scale_factor()
        }

        fn request_repaint(&mut self) {
            self.inner.request_repaint()
        }

        fn create_bitmap(&mut self, size: PixelSize, dpi: Dpi, reference_dpi: f64, format: PixelFormat) -> anyhow::Result<MemoryBitmap> {
            self.inner.create_bitmap(size, dpi, reference_dpi, format)
        }

        fn release_bitmap(&mut self, bitmap: MemoryBitmap) {
            self.released.set(self.released.get() + 1);
            self.inner.release_bitmap(bitmap)
        }
    }

    #[test]
    fn starts_detached_and_ignores_paint() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();

        assert_eq!(panel.state(), PanelState::Detached);
        panel.paint(&mut canvas).unwrap();
        assert!(canvas.draws.is_empty());
        assert_eq!(panel.host().allocated(), 0);
    }

    #[test]
    fn resize_makes_panel_ready_and_requests_repaint() {
        let mut panel = software_panel(1.0);
        panel.on_size_changed(LogicalSize::new(200.0, 150.0)).unwrap();

        assert_eq!(panel.state(), PanelState::Ready);
        assert_eq!(panel.host().repaint_requests(), 1);
        assert_eq!(panel.renderer().unwrap().frames_rendered(), 0);
        assert_eq!(panel.driver().unwrap().size(), PixelSize::new(200, 150));
    }

    #[test]
    fn zero_width_detaches_without_resizing_driver() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(200.0, 150.0)).unwrap();
        panel.paint(&mut canvas).unwrap();

        panel.on_size_changed(LogicalSize::new(0.0, 150.0)).unwrap();
        assert_eq!(panel.state(), PanelState::Detached);
        assert_eq!(panel.size().unwrap(), PixelSize::new(200, 150));

        panel.paint(&mut canvas).unwrap();
        assert_eq!(canvas.draws.len(), 1);
        assert_eq!(panel.renderer().unwrap().frames_rendered(), 1);
    }

    #[test]
    fn paint_runs_configure_render_publish() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();

        panel.paint(&mut canvas).unwrap();
        panel.paint(&mut canvas).unwrap();

        let renderer = panel.renderer().unwrap();
        assert_eq!(renderer.configure_count(), 2);
        assert_eq!(renderer.frames_rendered(), 2);
        assert_eq!(canvas.draws.len(), 2);
        assert_eq!(panel.host().allocated(), 1);
        assert_eq!(panel.presentation_stats().reuses, 1);
    }

    #[test]
    fn scale_change_without_resize_is_picked_up_on_paint() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(100.0, 50.0)).unwrap();
        panel.paint(&mut canvas).unwrap();

        panel.host_mut().set_scale_factor(2.0);
        panel.paint(&mut canvas).unwrap();

        let last = canvas.last().unwrap();
        assert_eq!(last.dest, PixelRect::from_size(PixelSize::new(200, 100)));
        assert_eq!(last.dpi, Dpi { x: 48.0, y: 48.0 });
        assert_eq!(panel.driver().unwrap().size(), PixelSize::new(200, 100));
        assert_eq!(panel.host().allocated(), 2);
        assert_eq!(panel.host().live(), 1);
    }

    #[test]
    fn oversized_bounds_are_a_driver_error() {
        let mut panel = software_panel(1.0);
        let result = panel.on_size_changed(LogicalSize::new(1e10, 1e10));

        assert!(matches!(result, Err(BridgeError::Driver(_))));
        assert_eq!(panel.state(), PanelState::Detached);
        assert_eq!(panel.size().unwrap(), PixelSize::ZERO);
    }

    #[test]
    fn detached_panel_recovers_when_scale_grows() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(0.6, 100.0)).unwrap();
        assert_eq!(panel.state(), PanelState::Detached);

        panel.paint(&mut canvas).unwrap();
        assert!(canvas.draws.is_empty());

        panel.host_mut().set_scale_factor(3.0);
        panel.paint(&mut canvas).unwrap();

        assert_eq!(panel.state(), PanelState::Ready);
        assert_eq!(canvas.draws.len(), 1);
        assert_eq!(canvas.last().unwrap().dest, PixelRect::from_size(PixelSize::new(1, 300)));
        assert_eq!(panel.size().unwrap(), PixelSize::new(1, 300));
    }

    #[test]
    fn scale_drop_detaches_until_it_recovers() {
        let mut panel = software_panel(2.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(0.6, 100.0)).unwrap();
        assert_eq!(panel.state(), PanelState::Ready);

        panel.host_mut().set_scale_factor(1.0);
        panel.paint(&mut canvas).unwrap();
        assert_eq!(panel.state(), PanelState::Detached);
        assert!(canvas.draws.is_empty());

        panel.host_mut().set_scale_factor(2.0);
        panel.paint(&mut canvas).unwrap();
        assert_eq!(panel.state(), PanelState::Ready);
        assert_eq!(canvas.draws.len(), 1);
    }

    #[test]
    fn timeout_reaches_renderer() {
        let mut panel = software_panel(1.0);
        assert_eq!(panel.timeout().unwrap(), None);

        panel.set_timeout(Some(Duration::from_millis(250))).unwrap();
        assert_eq!(panel.timeout().unwrap(), Some(Duration::from_millis(250)));
        assert_eq!(panel.renderer().unwrap().timeout(), Some(Duration::from_millis(250)));

        panel.dispose();
        assert!(matches!(panel.timeout(), Err(BridgeError::Disposed)));
        assert!(matches!(panel.size(), Err(BridgeError::Disposed)));
    }

    #[test]
    fn invalid_host_scale_uses_fallback() {
        let config = PanelConfig::builder().fallback_scale(2.0).build().unwrap();
        let mut panel = RasterPanel::new(SoftwareRenderer::new(PixelFormat::Rgba8), MemoryHost::new(f64::NAN), config).unwrap();
        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
        assert_eq!(panel.driver().unwrap().size(), PixelSize::new(20, 20));
    }

    #[test]
    fn non_packed_surface_is_reported() {
        let mut panel = RasterPanel::new(NullRenderer::new(), MemoryHost::new(1.0), PanelConfig::default()).unwrap();
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();

        let err = panel.paint(&mut canvas).unwrap_err();
        assert!(matches!(err, BridgeError::SurfaceMismatch { ref renderer } if renderer == "NullRenderer"));
        assert!(canvas.draws.is_empty());
        assert_eq!(panel.host().allocated(), 0);
        assert!(panel.snapshot().unwrap().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PanelConfig { reference_dpi: 0.0, ..PanelConfig::default() };
        let result = RasterPanel::new(NullRenderer::new(), MemoryHost::new(1.0), config);
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn dispose_twice_releases_once() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
        panel.paint(&mut canvas).unwrap();

        panel.dispose();
        panel.dispose();

        assert_eq!(panel.state(), PanelState::Disposed);
        assert_eq!(panel.host().released(), 1);
        assert_eq!(panel.host().live(), 0);
    }

    #[test]
    fn drop_disposes() {
        let released = Rc::new(Cell::new(0));
        {
            let host = SharedHost { inner: MemoryHost::new(1.0), released: released.clone() };
            let mut panel = RasterPanel::new(SoftwareRenderer::new(PixelFormat::Rgba8), host, PanelConfig::default()).unwrap();
            let mut canvas = RecordingCanvas::default();
            panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
            panel.paint(&mut canvas).unwrap();
            panel.dispose();
        }
        assert_eq!(released.get(), 1);

        let released = Rc::new(Cell::new(0));
        {
            let host = SharedHost { inner: MemoryHost::new(1.0), released: released.clone() };
            let mut panel = RasterPanel::new(SoftwareRenderer::new(PixelFormat::Rgba8), host, PanelConfig::default()).unwrap();
            let mut canvas = RecordingCanvas::default();
            panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
            panel.paint(&mut canvas).unwrap();
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn disposed_panel_is_inert() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        let recorder = Rc::new(RefCell::new(InputRecorder::default()));
        panel.set_input_controller(Box::new(SharedRecorder(recorder.clone())));
        panel.dispose();

        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
        assert_eq!(panel.state(), PanelState::Disposed);
        panel.paint(&mut canvas).unwrap();
        panel.handle_pointer(&HostPointerEvent::Entered);
        panel.invalidate();

        assert!(canvas.draws.is_empty());
        assert!(recorder.borrow().calls.is_empty());
        assert_eq!(panel.host().repaint_requests(), 0);
        assert_eq!(panel.pump_events(), 0);
        assert!(matches!(panel.back_color(), Err(BridgeError::Disposed)));
        assert!(matches!(panel.fps(), Err(BridgeError::Disposed)));
        assert!(matches!(panel.pick_at(LogicalPoint::new(1.0, 1.0)), Err(BridgeError::Disposed)));
        assert!(matches!(panel.events_mut(), Err(BridgeError::Disposed)));
    }

    #[test]
    fn pointer_events_reach_controller() {
        let config = PanelConfig::builder().clock_running(false).build().unwrap();
        let mut panel = RasterPanel::new(SoftwareRenderer::new(PixelFormat::Rgba8), MemoryHost::new(2.0), config).unwrap();
        panel.clock_mut().advance(42);
        panel.on_size_changed(LogicalSize::new(200.0, 100.0)).unwrap();

        let recorder = Rc::new(RefCell::new(InputRecorder::default()));
        assert!(panel.set_input_controller(Box::new(SharedRecorder(recorder.clone()))).is_none());

        panel.handle_pointer(&HostPointerEvent::Entered);
        panel.handle_pointer(&HostPointerEvent::Released {
            sample: PointerSample::new(LogicalPoint::new(40.0, 30.0), Modifiers::empty(), PointerButtons::empty()),
            initial_button: PointerButtons::RIGHT,
        });
        panel.handle_pointer(&HostPointerEvent::Tapped { position: LogicalPoint::new(40.0, 30.0), modifiers: Modifiers::empty() });

        let recorder = recorder.borrow();
        assert_eq!(recorder.kinds(), vec!["enter", "up", "click"]);

        let up = recorder.calls[1].1.unwrap();
        assert_eq!(up.button, MouseButton::Right);
        assert_eq!(up.time_ms, 42);

        let click = recorder.last().unwrap();
        assert_eq!(click.fraction, (0.2, 0.3));
        assert_eq!(click.position, crate::geometry::PixelPoint::new(80, 60));
        assert_eq!(click.clicks, 1);
    }

    #[test]
    fn pointer_without_controller_is_dropped() {
        let mut panel = software_panel(1.0);
        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
        panel.handle_pointer(&HostPointerEvent::Moved(PointerSample::at(1.0, 1.0)));
        assert!(panel.take_input_controller().is_none());
    }

    #[test]
    fn pick_and_snapshot_follow_scene() {
        let mut panel = software_panel(2.0);
        let mut canvas = RecordingCanvas::default();
        panel.on_size_changed(LogicalSize::new(50.0, 50.0)).unwrap();
        panel.set_back_color(Color::WHITE).unwrap();

        let mut scene = RenderList::new();
        scene.add_command(DisplayItem::Rect {
            x: 0.0,
            y: 0.0,
            w: 0.5,
            h: 0.5,
            color: Color::from_u8(255, 0, 0, 255),
            id: Some(7),
        });
        panel.set_scene(scene).unwrap();
        panel.paint(&mut canvas).unwrap();

        assert_eq!(panel.pick_at(LogicalPoint::new(10.0, 10.0)).unwrap(), Some(7));
        assert_eq!(panel.pick_at(LogicalPoint::new(40.0, 40.0)).unwrap(), None);

        let image = panel.snapshot().unwrap().unwrap();
        assert_eq!((image.width, image.height), (100, 100));
        assert_eq!(image.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(90, 90), Some([255, 255, 255, 255]));
    }

    #[test]
    fn frame_events_reach_listeners() {
        let mut panel = software_panel(1.0);
        let mut canvas = RecordingCanvas::default();
        let frames = Rc::new(Cell::new(0));
        let f = frames.clone();
        panel.events_mut().unwrap().on_frame_end(move |_| f.set(f.get() + 1));

        panel.on_size_changed(LogicalSize::new(10.0, 10.0)).unwrap();
        panel.paint(&mut canvas).unwrap();
        panel.paint(&mut canvas).unwrap();
        assert_eq!(frames.get(), 2);
    }
}
