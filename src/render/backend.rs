use crate::events::{DriverEvent, DriverEventSender};
use crate::geometry::{PixelPoint, PixelSize};
use crate::input::InputController;
use crate::render::render_list::Color;
use anyhow::{anyhow, Result};
use std::any::Any;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Byte layout of a 4-byte-per-pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Bytes R, G, B, A
    Rgba8,
    /// Bytes B, G, R, A
    Bgra8,
    /// Native-endian premultiplied 0xAARRGGBB words (cairo's ARGB32)
    PreMulArgb32,
}

impl PixelFormat {
    /// Encodes a color as the four bytes of one pixel in this format.
    pub fn encode(&self, color: Color) -> [u8; 4] {
        let [r, g, b, a] = color.to_u8_array();
        match self {
            PixelFormat::Rgba8 => [r, g, b, a],
            PixelFormat::Bgra8 => [b, g, r, a],
            PixelFormat::PreMulArgb32 => {
                let pm = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
                u32::from_be_bytes([a, pm(r), pm(g), pm(b)]).to_ne_bytes()
            }
        }
    }

    /// Decodes one pixel of this format to straight RGBA bytes.
    pub fn decode(&self, px: [u8; 4]) -> [u8; 4] {
        match self {
            PixelFormat::Rgba8 => px,
            PixelFormat::Bgra8 => [px[2], px[1], px[0], px[3]],
            PixelFormat::PreMulArgb32 => {
                let [a, r, g, b] = u32::from_ne_bytes(px).to_be_bytes();
                let unpm = |c: u8| {
                    if a == 0 {
                        0
                    } else {
                        ((c as u16 * 255 + a as u16 / 2) / a as u16).min(255) as u8
                    }
                };
                [unpm(r), unpm(g), unpm(b), a]
            }
        }
    }
}

/// Small RGBA8 snapshot of a rendered frame.
#[derive(Clone)]
pub struct RgbaImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

impl RgbaImage {
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32, stride: u32) -> Result<Self> {
        if pixels.len() < (height as usize) * (stride as usize) {
            return Err(anyhow!("pixel buffer too small for image dimensions"));
        }

        Ok(Self { pixels, width, height, stride })
    }

    /// Converts a tightly packed buffer of the given format to RGBA8.
    pub fn from_packed(pixels: &[u8], size: PixelSize, format: PixelFormat) -> Result<Self> {
        let len = size.byte_len();
        if pixels.len() < len {
            return Err(anyhow!("pixel buffer holds {} bytes, {} expected", pixels.len(), len));
        }

        let rgba = pixels[..len]
            .chunks_exact(4)
            .flat_map(|px| format.decode([px[0], px[1], px[2], px[3]]))
            .collect();

        Self::from_raw(rgba, size.width, size.height, size.stride() as u32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.stride as usize + x as usize * 4;
        self.pixels.get(at..at + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Encodes the image as PNG.
    pub fn encode_png<W: Write>(&self, writer: W) -> Result<()> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;

        let row = self.width as usize * 4;
        if self.stride as usize == row {
            writer.write_image_data(&self.pixels[..row * self.height as usize])?;
        } else {
            let tight: Vec<u8> = self
                .pixels
                .chunks(self.stride as usize)
                .take(self.height as usize)
                .flat_map(|line| line[..row].iter().copied())
                .collect();
            writer.write_image_data(&tight)?;
        }
        Ok(())
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.encode_png(std::io::BufWriter::new(file))
    }
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Type-erased pixel surface so the driver can hold it without generics.
pub trait ErasedSurface: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn size(&self) -> PixelSize;
    /// Resizes the backing store. Contents are undefined afterwards.
    fn resize(&mut self, size: PixelSize) -> Result<()>;
}

/// The renderer contract consumed by the bridge. Calls occur on the UI thread.
pub trait Renderer {
    /// Scene graph type the renderer draws.
    type Scene;

    fn name(&self) -> &str;

    /// Create the pixel surface this renderer paints into.
    fn create_surface(&self, size: PixelSize) -> Result<Box<dyn ErasedSurface>>;

    /// Prepare renderer state for the next frame. Idempotent.
    fn configure(&mut self);

    /// Render one complete frame into `surface`, blocking until done. Failures
    /// are reported through `emit` as [`DriverEvent::RenderFailed`].
    fn render(&mut self, surface: &mut dyn ErasedSurface, emit: &mut dyn FnMut(DriverEvent));

    /// Id of the object at `point` (physical pixels), if any.
    fn pick(&mut self, surface: &dyn ErasedSurface, point: PixelPoint, time_ms: i64) -> Option<u32>;

    fn back_color(&self) -> Color;
    fn set_back_color(&mut self, color: Color);

    fn scene(&self) -> &Self::Scene;
    fn scene_mut(&mut self) -> &mut Self::Scene;
    fn set_scene(&mut self, scene: Self::Scene);

    /// Current frames-per-second estimate.
    fn fps(&self) -> u32;

    /// Frames taking longer than this are reported as failed. `None` when the
    /// renderer has no limit.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Renderers without a frame limit ignore this.
    fn set_timeout(&mut self, _timeout: Option<Duration>) {}

    /// Gives the renderer a sender for events raised on its own threads.
    fn attach_events(&mut self, _sender: DriverEventSender) {}

    /// Consumer for normalized pointer input, if the renderer handles input.
    fn input_controller(&mut self) -> Option<&mut dyn InputController> {
        None
    }
}
