//! Presentation of rendered frames to the host.
//!
//! After every render the pixel surface holds one complete frame in physical
//! pixels. [`PresentationSurface`] moves that frame into a bitmap the host can
//! paint, and hands the bitmap to the host's drawing context:
//!
//! 1. the target size is the rendered size of the pixel surface;
//! 2. a bitmap is allocated lazily, and replaced (allocate new, swap, release
//!    old) only when the target size changes. Bitmaps carry
//!    `reference_dpi / scale` resolution metadata so the host shows them at
//!    their logical size;
//! 3. otherwise the bitmap is reused frame after frame;
//! 4. the bitmap is locked for exactly the duration of the copy, which always
//!    moves `width * height * 4` bytes of the *current* bitmap;
//! 5. the bitmap is drawn with a destination rectangle of its physical size.
//!
//! Hosts plug in through [`PresentationHost`], [`HostBitmap`] and
//! [`DrawingContext`]. A headless host lives in [`memory`]; a cairo host is
//! available with the `backend_cairo` feature.

use crate::errors::BridgeError;
use crate::geometry::{Dpi, PixelRect, PixelSize, ScaleFactor};
use crate::render::backend::{ErasedSurface, PixelFormat};
use crate::render::surface::PackedPixelSurface;
use anyhow::Result;
use std::ops::DerefMut;

#[cfg(feature = "backend_cairo")]
pub mod cairo;
pub mod memory;

/// A bitmap the host knows how to paint.
pub trait HostBitmap {
    /// Exclusive write access to the backing memory, released on drop.
    type Lock<'a>: DerefMut<Target = [u8]>
    where
        Self: 'a;

    fn size(&self) -> PixelSize;
    fn dpi(&self) -> Dpi;
    /// Updates resolution metadata without touching the backing memory.
    fn set_dpi(&mut self, dpi: Dpi);
    fn lock(&mut self) -> Result<Self::Lock<'_>>;
}

/// The host framework, as seen by the bridge.
pub trait PresentationHost {
    type Bitmap: HostBitmap;

    /// Current display scale factor. May change between any two calls.
    fn scale_factor(&self) -> f64;

    /// Ask the host to schedule a paint.
    fn request_repaint(&mut self);

    /// Allocates a bitmap of `size`. `dpi` is `reference_dpi / scale`; hosts
    /// that store resolution as a scale convert back with `reference_dpi`.
    fn create_bitmap(&mut self, size: PixelSize, dpi: Dpi, reference_dpi: f64, format: PixelFormat) -> Result<Self::Bitmap>;

    /// Dispose of a bitmap that is no longer presented.
    fn release_bitmap(&mut self, bitmap: Self::Bitmap) {
        drop(bitmap);
    }
}

/// Drawing context handed to the paint callback.
pub trait DrawingContext<B> {
    /// Draws `bitmap` into `dest`, which is given in physical pixels.
    fn draw_image(&mut self, bitmap: &B, dest: PixelRect) -> Result<()>;
}

/// Observable counters of a [`PresentationSurface`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationStats {
    /// Bitmaps allocated
    pub allocations: u64,
    /// Frames published into an already existing bitmap
    pub reuses: u64,
    /// Bitmaps handed back to the host
    pub releases: u64,
    /// Frames drawn
    pub frames: u64,
    /// Bytes moved by the most recent copy
    pub last_copy_len: usize,
}

/// Owns the host bitmap and publishes rendered frames into it.
pub struct PresentationSurface<B: HostBitmap> {
    bitmap: Option<B>,
    size: PixelSize,
    reference_dpi: f64,
    stats: PresentationStats,
}

impl<B: HostBitmap> PresentationSurface<B> {
    pub fn new(reference_dpi: f64) -> Self {
        Self {
            bitmap: None,
            size: PixelSize::ZERO,
            reference_dpi,
            stats: PresentationStats::default(),
        }
    }

    pub fn bitmap(&self) -> Option<&B> {
        self.bitmap.as_ref()
    }

    /// Size of the current bitmap, zero when there is none.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn stats(&self) -> PresentationStats {
        self.stats
    }

    /// Copies the frame in `surface` into the host bitmap and draws it.
    pub fn publish<H, C>(
        &mut self,
        host: &mut H,
        surface: &dyn ErasedSurface,
        renderer: &str,
        scale: ScaleFactor,
        canvas: &mut C,
    ) -> Result<(), BridgeError>
    where
        H: PresentationHost<Bitmap = B>,
        C: DrawingContext<B> + ?Sized,
    {
        let packed = surface
            .as_any()
            .downcast_ref::<PackedPixelSurface>()
            .ok_or_else(|| BridgeError::SurfaceMismatch { renderer: renderer.to_string() })?;

        let target = packed.size();
        if !target.is_paintable() {
            log::trace!("nothing to publish, surface is {target}");
            return Ok(());
        }

        let dpi = Dpi::for_scale(self.reference_dpi, scale);
        let bitmap = self.ensure_bitmap(host, target, dpi, packed.format())?;

        let len = copy_frame(bitmap, packed.pixels())?;
        self.stats.last_copy_len = len;

        let dest = PixelRect::from_size(self.size);
        if let Some(bitmap) = self.bitmap.as_ref() {
            canvas.draw_image(bitmap, dest).map_err(BridgeError::Host)?;
            self.stats.frames += 1;
        }
        Ok(())
    }

    fn ensure_bitmap<H>(&mut self, host: &mut H, target: PixelSize, dpi: Dpi, format: PixelFormat) -> Result<&mut B, BridgeError>
    where
        H: PresentationHost<Bitmap = B>,
    {
        match self.bitmap.as_ref() {
            Some(current) if current.size() == target => {
                self.stats.reuses += 1;
            }
            _ => {
                let fresh = host.create_bitmap(target, dpi, self.reference_dpi, format).map_err(BridgeError::Host)?;
                self.stats.allocations += 1;
                log::debug!("allocated {target} presentation bitmap ({:.1} dpi)", dpi.x);

                if let Some(old) = self.bitmap.replace(fresh) {
                    host.release_bitmap(old);
                    self.stats.releases += 1;
                }
                self.size = target;
            }
        }

        let bitmap = self.bitmap.as_mut().ok_or_else(|| BridgeError::Host(anyhow::anyhow!("presentation bitmap missing")))?;
        if bitmap.dpi() != dpi {
            bitmap.set_dpi(dpi);
        }
        Ok(bitmap)
    }

    /// Hands the bitmap back to the host. Releasing twice is a no-op.
    pub fn release<H>(&mut self, host: &mut H)
    where
        H: PresentationHost<Bitmap = B>,
    {
        if let Some(bitmap) = self.bitmap.take() {
            host.release_bitmap(bitmap);
            self.stats.releases += 1;
            self.size = PixelSize::ZERO;
        }
    }
}

/// Copies `bitmap.size().byte_len()` bytes of `src` into the locked bitmap.
fn copy_frame<B: HostBitmap>(bitmap: &mut B, src: &[u8]) -> Result<usize, BridgeError> {
    let len = bitmap.size().byte_len();
    let mut lock = bitmap.lock().map_err(BridgeError::Host)?;
    if src.len() < len {
        return Err(BridgeError::CopyLength { expected: len, actual: src.len() });
    }

    let dst: &mut [u8] = &mut lock;
    if dst.len() < len {
        return Err(BridgeError::CopyLength { expected: len, actual: dst.len() });
    }
    dst[..len].copy_from_slice(&src[..len]);
    Ok(len)
}
