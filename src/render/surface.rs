use crate::geometry::PixelSize;
use crate::render::backend::{ErasedSurface, PixelFormat};
use crate::render::render_list::Color;
use anyhow::{anyhow, Result};
use std::any::Any;

/// Tightly packed 4-byte-per-pixel buffer, row-major, stride `width * 4`.
///
/// This is the only pixel surface the presentation layer knows how to copy
/// from; renderers that want to be presented must paint into one.
pub struct PackedPixelSurface {
    pixels: Vec<u8>,
    size: PixelSize,
    format: PixelFormat,
    /// Bumped by the renderer for every completed frame.
    pub frame_id: u64,
}

impl PackedPixelSurface {
    /// Fails when a buffer of `size` cannot be addressed.
    pub fn new(size: PixelSize, format: PixelFormat) -> Result<Self> {
        let len = checked_len(size)?;
        Ok(Self {
            pixels: vec![0u8; len],
            size,
            format,
            frame_id: 0,
        })
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Read-only view of exactly `size.byte_len()` bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Color) {
        let px = self.format.encode(color);
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Fills the clipped pixel rectangle `[x0, x1) x [y0, y1)`.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Color) {
        let x1 = x1.min(self.size.width);
        let y1 = y1.min(self.size.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let px = self.format.encode(color);
        let stride = self.size.stride();
        for y in y0..y1 {
            let row = y as usize * stride;
            let line = &mut self.pixels[row + x0 as usize * 4..row + x1 as usize * 4];
            for chunk in line.chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let at = y as usize * self.size.stride() + x as usize * 4;
        Some([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2], self.pixels[at + 3]])
    }
}

fn checked_len(size: PixelSize) -> Result<usize> {
    size.checked_byte_len().ok_or_else(|| anyhow!("surface of {size} does not fit in memory"))
}

impl std::fmt::Debug for PackedPixelSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedPixelSurface")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

impl ErasedSurface for PackedPixelSurface {
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
        if size == self.size {
            return Ok(());
        }

        let len = checked_len(size)?;

        // shrinking keeps the allocation
        self.pixels.resize(len, 0);
        self.size = size;
        Ok(())
    }
}
