use super::{DrawingContext, HostBitmap, PresentationHost};
use crate::geometry::{Dpi, PixelRect, PixelSize};
use crate::render::backend::PixelFormat;
use anyhow::{anyhow, Result};

/// Presentation bitmap backed by a cairo image surface.
///
/// Resolution metadata is stored as the surface's device scale, which is how
/// cairo (and GTK on top of it) maps physical pixels back to logical units.
pub struct CairoBitmap {
    surface: cairo::ImageSurface,
    size: PixelSize,
    reference_dpi: f64,
}

impl CairoBitmap {
    fn new(size: PixelSize, dpi: Dpi, reference_dpi: f64) -> Result<Self> {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, size.width as i32, size.height as i32)?;

        // The copy moves width * 4 bytes per row, so rows must not be padded
        if surface.stride() as usize != size.stride() {
            return Err(anyhow!("cairo stride {} does not match packed stride {}", surface.stride(), size.stride()));
        }

        let mut bitmap = Self { surface, size, reference_dpi };
        bitmap.set_dpi(dpi);
        Ok(bitmap)
    }

    #[inline]
    pub fn surface(&self) -> &cairo::ImageSurface {
        &self.surface
    }
}

impl HostBitmap for CairoBitmap {
    type Lock<'a> = cairo::ImageSurfaceData<'a>;

    fn size(&self) -> PixelSize {
        self.size
    }

    fn dpi(&self) -> Dpi {
        let (sx, sy) = self.surface.device_scale();
        Dpi { x: self.reference_dpi / sx, y: self.reference_dpi / sy }
    }

    fn set_dpi(&mut self, dpi: Dpi) {
        let (sx, sy) = dpi.scale(self.reference_dpi);
        self.surface.set_device_scale(sx, sy);
    }

    /// Fails when someone else still holds a reference to the surface, e.g. a
    /// context that still has it set as source.
    fn lock(&mut self) -> Result<cairo::ImageSurfaceData<'_>> {
        self.surface.flush();
        self.surface.data().map_err(|e| anyhow!("cannot lock cairo surface: {e}"))
    }
}

/// Host adapter for toolkits that paint through cairo (GTK drawing areas,
/// offscreen cairo contexts).
pub struct CairoHost {
    scale: f64,
    /// Invoked when the panel wants to be repainted. Typically connected to a
    /// widget's `queue_draw()`.
    redraw_cb: Box<dyn FnMut() + 'static>,
}

impl CairoHost {
    pub fn new<F: FnMut() + 'static>(scale: f64, redraw_cb: F) -> Self {
        Self { scale, redraw_cb: Box::new(redraw_cb) }
    }

    /// Update from the widget's scale factor, e.g. on `notify::scale-factor`.
    pub fn set_scale_factor(&mut self, scale: f64) {
        self.scale = scale;
    }
}

impl PresentationHost for CairoHost {
    type Bitmap = CairoBitmap;

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn request_repaint(&mut self) {
        (self.redraw_cb)();
    }

    fn create_bitmap(&mut self, size: PixelSize, dpi: Dpi, reference_dpi: f64, format: PixelFormat) -> Result<CairoBitmap> {
        match format {
            PixelFormat::PreMulArgb32 => {}
            PixelFormat::Bgra8 if cfg!(target_endian = "little") => {}
            other => return Err(anyhow!("cairo cannot present {other:?} pixels")),
        }
        CairoBitmap::new(size, dpi, reference_dpi)
    }
}

impl DrawingContext<CairoBitmap> for cairo::Context {
    fn draw_image(&mut self, bitmap: &CairoBitmap, dest: PixelRect) -> Result<()> {
        let (sx, sy) = bitmap.surface.device_scale();
        let x = dest.x as f64 / sx;
        let y = dest.y as f64 / sy;

        self.save()?;
        self.rectangle(x, y, dest.width as f64 / sx, dest.height as f64 / sy);
        self.clip();
        self.set_source_surface(&bitmap.surface, x, y)?;
        self.paint()?;
        // restoring drops the source pattern, so the surface can be locked again
        self.restore()?;
        Ok(())
    }
}
