use crate::events::{DriverEvent, RenderParameter};
use crate::geometry::{PixelPoint, PixelSize};
use crate::render::backend::{ErasedSurface, Renderer};
use crate::render::render_list::Color;
use anyhow::{anyhow, Result};
use std::any::Any;

/// Null renderer that does not produce any pixels.
///
/// Its surface is not a packed pixel buffer, so panels driving it can lay out,
/// resize and dispatch input, but publishing a frame fails.
pub struct NullRenderer {
    back_color: Color,
    scene: (),
    configured: u64,
}

impl NullRenderer {
    /// Creates a new instance of the null renderer.
    pub fn new() -> Self {
        Self { back_color: Color::BLACK, scene: (), configured: 0 }
    }

    /// How often `configure` has been called.
    pub fn configure_count(&self) -> u64 {
        self.configured
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for NullRenderer {
    type Scene = ();

    fn name(&self) -> &str {
        "NullRenderer"
    }

    fn create_surface(&self, size: PixelSize) -> Result<Box<dyn ErasedSurface>> {
        Ok(Box::new(NullSurface::new(size)))
    }

    fn configure(&mut self) {
        self.configured += 1;
    }

    fn render(&mut self, surface: &mut dyn ErasedSurface, emit: &mut dyn FnMut(DriverEvent)) {
        let Some(s) = surface.as_any_mut().downcast_mut::<NullSurface>() else {
            emit(DriverEvent::render_failed(anyhow!("NullRenderer used with non-Null surface"), false));
            return;
        };

        let param = RenderParameter { frame_id: s.frame_id, time_ms: 0, size: s.size };
        emit(DriverEvent::FrameBegin(param));
        s.frame_id = s.frame_id.wrapping_add(1);
        emit(DriverEvent::FrameEnd(param));
    }

    fn pick(&mut self, _surface: &dyn ErasedSurface, _point: PixelPoint, _time_ms: i64) -> Option<u32> {
        None
    }

    fn back_color(&self) -> Color {
        self.back_color
    }

    fn set_back_color(&mut self, color: Color) {
        self.back_color = color;
    }

    fn scene(&self) -> &() {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut () {
        &mut self.scene
    }

    fn set_scene(&mut self, _scene: ()) {}

    fn fps(&self) -> u32 {
        0
    }
}

pub struct NullSurface {
    /// Size of the surface in pixels.
    pub size: PixelSize,
    /// Frame ID for the surface, used to track rendering frames.
    frame_id: u64,
}

impl NullSurface {
    pub fn new(size: PixelSize) -> Self {
        Self { size, frame_id: 0 }
    }
}

impl ErasedSurface for NullSurface {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn size(&self) -> PixelSize {
        self.size
    }
    fn resize(&mut self, size: PixelSize) -> Result<()> {
        self.size = size;
        Ok(())
    }
}
