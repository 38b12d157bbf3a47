//! CPU rasterizer for [`RenderList`] scenes.
//!
//! Paints clears and solid rectangles into a [`PackedPixelSurface`]. Good
//! enough for headless use, previews and for exercising the presentation
//! bridge end to end without a real scene graph.

use crate::events::{DriverEvent, RenderParameter};
use crate::geometry::{PixelPoint, PixelSize};
use crate::render::backend::{ErasedSurface, PixelFormat, Renderer};
use crate::render::render_list::{Color, DisplayItem, RenderList};
use crate::render::surface::PackedPixelSurface;
use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

/// Frames-per-second estimate over one second windows.
#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self { window_start: Instant::now(), frames: 0, fps: 0 }
    }

    /// Counts a frame; returns the new estimate when it changed.
    fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }

        let fps = (self.frames as f64 / elapsed.as_secs_f64()).round() as u32;
        self.frames = 0;
        self.window_start = now;
        if fps != self.fps {
            self.fps = fps;
            Some(fps)
        } else {
            None
        }
    }
}

pub struct SoftwareRenderer {
    format: PixelFormat,
    back_color: Color,
    scene: RenderList,
    frame_id: u64,
    timeout: Option<Duration>,
    epoch: Instant,
    fps: FpsCounter,
    configure_count: u64,
}

impl SoftwareRenderer {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            back_color: Color::WHITE,
            scene: RenderList::new(),
            frame_id: 0,
            timeout: None,
            epoch: Instant::now(),
            fps: FpsCounter::new(),
            configure_count: 0,
        }
    }

    /// Frames taking longer than `timeout` are reported as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_id
    }

    pub fn configure_count(&self) -> u64 {
        self.configure_count
    }

    fn paint(&self, surface: &mut PackedPixelSurface) {
        let size = surface.size();
        surface.fill(self.back_color);

        for item in &self.scene.items {
            match item {
                DisplayItem::Clear { color } => surface.fill(*color),
                DisplayItem::Rect { x, y, w, h, color, .. } => {
                    let x0 = edge(*x, size.width);
                    let y0 = edge(*y, size.height);
                    let x1 = edge(x + w, size.width);
                    let y1 = edge(y + h, size.height);
                    surface.fill_rect(x0, y0, x1, y1, *color);
                }
            }
        }
    }
}

/// Pixel edge for a fractional coordinate, clamped to the surface.
#[inline]
fn edge(fraction: f32, extent: u32) -> u32 {
    (fraction * extent as f32).round().clamp(0.0, extent as f32) as u32
}

impl Renderer for SoftwareRenderer {
    type Scene = RenderList;

    fn name(&self) -> &str {
        "SoftwareRenderer"
    }

    fn create_surface(&self, size: PixelSize) -> Result<Box<dyn ErasedSurface>> {
        Ok(Box::new(PackedPixelSurface::new(size, self.format)?))
    }

    fn configure(&mut self) {
        self.configure_count += 1;
    }

    fn render(&mut self, surface: &mut dyn ErasedSurface, emit: &mut dyn FnMut(DriverEvent)) {
        let Some(s) = surface.as_any_mut().downcast_mut::<PackedPixelSurface>() else {
            emit(DriverEvent::render_failed(anyhow!("SoftwareRenderer used with non-packed surface"), false));
            return;
        };

        let started = Instant::now();
        let param = RenderParameter {
            frame_id: self.frame_id,
            time_ms: started.duration_since(self.epoch).as_millis() as i64,
            size: s.size(),
        };
        emit(DriverEvent::FrameBegin(param));

        self.paint(s);
        s.frame_id = self.frame_id;
        self.frame_id = self.frame_id.wrapping_add(1);

        let finished = Instant::now();
        if let Some(limit) = self.timeout {
            let took = finished.duration_since(started);
            if took > limit {
                emit(DriverEvent::render_failed(
                    anyhow!("frame {} took {:?}, limit is {:?}", param.frame_id, took, limit),
                    true,
                ));
                return;
            }
        }

        emit(DriverEvent::FrameEnd(param));
        if let Some(fps) = self.fps.tick(finished) {
            emit(DriverEvent::FpsChanged { fps });
        }
    }

    fn pick(&mut self, surface: &dyn ErasedSurface, point: PixelPoint, _time_ms: i64) -> Option<u32> {
        let size = surface.size();
        if !size.is_paintable() || point.x < 0 || point.y < 0 {
            return None;
        }
        let fx = (point.x as f32 + 0.5) / size.width as f32;
        let fy = (point.y as f32 + 0.5) / size.height as f32;
        self.scene.pick(fx, fy)
    }

    fn back_color(&self) -> Color {
        self.back_color
    }

    fn set_back_color(&mut self, color: Color) {
        self.back_color = color;
    }

    fn scene(&self) -> &RenderList {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut RenderList {
        &mut self.scene
    }

    fn set_scene(&mut self, scene: RenderList) {
        self.scene = scene;
    }

    fn fps(&self) -> u32 {
        self.fps.fps
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::null::NullSurface;

    fn scene() -> RenderList {
        let mut list = RenderList::new();
        list.add_command(DisplayItem::Rect {
            x: 0.5,
            y: 0.0,
            w: 0.5,
            h: 1.0,
            color: Color::from_u8(255, 0, 0, 255),
            id: Some(3),
        });
        list
    }

    #[test]
    fn paints_back_color_and_items() {
        let mut r = SoftwareRenderer::new(PixelFormat::Rgba8);
        r.set_back_color(Color::from_u8(0, 0, 255, 255));
        r.set_scene(scene());

        let mut surface = r.create_surface(PixelSize::new(4, 2)).unwrap();
        let mut events = Vec::new();
        r.render(surface.as_mut(), &mut |e| events.push(e.kind()));

        let s = surface.as_any().downcast_ref::<PackedPixelSurface>().unwrap();
        assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(s.pixel(3, 1), Some([255, 0, 0, 255]));
        assert_eq!(events.len(), 2);
        assert_eq!(r.frames_rendered(), 1);
    }

    #[test]
    fn wrong_surface_is_a_render_failure() {
        let mut r = SoftwareRenderer::new(PixelFormat::Bgra8);
        let mut surface = NullSurface::new(PixelSize::new(2, 2));
        let mut failed = None;
        r.render(&mut surface, &mut |e| {
            if let DriverEvent::RenderFailed { timeout, .. } = e {
                failed = Some(timeout);
            }
        });
        assert_eq!(failed, Some(false));
    }

    #[test]
    fn zero_timeout_reports_timeout() {
        let mut r = SoftwareRenderer::new(PixelFormat::Rgba8).with_timeout(Duration::ZERO);
        r.set_scene(scene());
        let mut surface = r.create_surface(PixelSize::new(512, 512)).unwrap();

        let mut kinds = Vec::new();
        let mut timeout = false;
        r.render(surface.as_mut(), &mut |e| {
            if let DriverEvent::RenderFailed { timeout: t, .. } = &e {
                timeout = *t;
            }
            kinds.push(e.kind());
        });

        // a 512x512 fill never completes in zero time
        assert!(timeout);
        assert!(!kinds.contains(&crate::events::DriverEventKind::FrameEnd));
    }

    #[test]
    fn pick_uses_physical_pixels() {
        let mut r = SoftwareRenderer::new(PixelFormat::Rgba8);
        r.set_scene(scene());
        let surface = r.create_surface(PixelSize::new(100, 50)).unwrap();

        assert_eq!(r.pick(surface.as_ref(), PixelPoint::new(75, 10), 0), Some(3));
        assert_eq!(r.pick(surface.as_ref(), PixelPoint::new(10, 10), 0), None);
        assert_eq!(r.pick(surface.as_ref(), PixelPoint::new(-1, 10), 0), None);
    }

    #[test]
    fn fps_counter_reports_changes_only() {
        let mut c = FpsCounter::new();
        let start = c.window_start;
        for i in 1..30 {
            assert_eq!(c.tick(start + Duration::from_millis(i * 10)), None);
        }
        assert_eq!(c.tick(start + Duration::from_secs(1)), Some(30));
        for i in 1..30 {
            c.tick(start + Duration::from_secs(1) + Duration::from_millis(i * 10));
        }
        assert_eq!(c.tick(start + Duration::from_secs(2)), None);
    }
}
