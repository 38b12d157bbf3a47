//! Headless presentation host.
//!
//! Bitmaps are plain byte vectors and drawing only records what would have
//! been painted. Used for offscreen rendering, snapshots and tests.

use super::{DrawingContext, HostBitmap, PresentationHost};
use crate::geometry::{Dpi, PixelRect, PixelSize};
use crate::render::backend::PixelFormat;
use anyhow::{anyhow, Result};
use std::ops::{Deref, DerefMut};

pub struct MemoryBitmap {
    id: u64,
    pixels: Vec<u8>,
    size: PixelSize,
    dpi: Dpi,
    format: PixelFormat,
    locked: bool,
    lock_count: u64,
}

impl MemoryBitmap {
    /// Host-unique id, stable for the bitmap's lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// How often the backing memory has been locked.
    pub fn lock_count(&self) -> u64 {
        self.lock_count
    }
}

impl std::fmt::Debug for MemoryBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBitmap")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("dpi", &self.dpi)
            .finish()
    }
}

/// Write guard over a [`MemoryBitmap`]'s bytes.
pub struct MemoryLock<'a> {
    pixels: &'a mut [u8],
    locked: &'a mut bool,
}

impl Deref for MemoryLock<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &*self.pixels
    }
}

impl DerefMut for MemoryLock<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut *self.pixels
    }
}

impl Drop for MemoryLock<'_> {
    fn drop(&mut self) {
        *self.locked = false;
    }
}

impl HostBitmap for MemoryBitmap {
    type Lock<'a> = MemoryLock<'a>;

    fn size(&self) -> PixelSize {
        self.size
    }

    fn dpi(&self) -> Dpi {
        self.dpi
    }

    fn set_dpi(&mut self, dpi: Dpi) {
        self.dpi = dpi;
    }

    fn lock(&mut self) -> Result<MemoryLock<'_>> {
        if self.locked {
            return Err(anyhow!("bitmap {} is already locked", self.id));
        }
        self.locked = true;
        self.lock_count += 1;
        Ok(MemoryLock { pixels: &mut self.pixels, locked: &mut self.locked })
    }
}

/// Host with a settable scale factor that counts what happens to its bitmaps.
#[derive(Debug)]
pub struct MemoryHost {
    scale: f64,
    next_id: u64,
    allocated: u64,
    released: u64,
    repaints: u64,
}

impl MemoryHost {
    pub fn new(scale: f64) -> Self {
        Self { scale, next_id: 1, allocated: 0, released: 0, repaints: 0 }
    }

    /// Simulates moving the control to a display with another scale.
    pub fn set_scale_factor(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    /// Bitmaps currently alive.
    pub fn live(&self) -> u64 {
        self.allocated - self.released
    }

    pub fn repaint_requests(&self) -> u64 {
        self.repaints
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PresentationHost for MemoryHost {
    type Bitmap = MemoryBitmap;

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn request_repaint(&mut self) {
        self.repaints += 1;
    }

    fn create_bitmap(&mut self, size: PixelSize, dpi: Dpi, _reference_dpi: f64, format: PixelFormat) -> Result<MemoryBitmap> {
        let len = size.checked_byte_len().ok_or_else(|| anyhow!("bitmap of {size} does not fit in memory"))?;
        let id = self.next_id;
        self.next_id += 1;
        self.allocated += 1;

        Ok(MemoryBitmap {
            id,
            pixels: vec![0u8; len],
            size,
            dpi,
            format,
            locked: false,
            lock_count: 0,
        })
    }

    fn release_bitmap(&mut self, bitmap: MemoryBitmap) {
        log::trace!("releasing memory bitmap {}", bitmap.id);
        self.released += 1;
    }
}

/// One recorded `draw_image` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub bitmap_id: u64,
    pub dest: PixelRect,
    pub dpi: Dpi,
}

/// Drawing context that records draws instead of painting.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub draws: Vec<DrawRecord>,
}

impl RecordingCanvas {
    pub fn last(&self) -> Option<&DrawRecord> {
        self.draws.last()
    }
}

impl DrawingContext<MemoryBitmap> for RecordingCanvas {
    fn draw_image(&mut self, bitmap: &MemoryBitmap, dest: PixelRect) -> Result<()> {
        self.draws.push(DrawRecord { bitmap_id: bitmap.id, dest, dpi: bitmap.dpi });
        Ok(())
    }
}
