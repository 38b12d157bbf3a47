//! Logical/physical coordinate transforms.
//!
//! Hosts lay controls out in *logical* units, while the renderer and its
//! pixel surface are addressed in *physical* (device) pixels. The two are
//! related by a [`ScaleFactor`] that the host may change at any moment
//! (moving a window to another display, zooming), so none of the transforms
//! in this module cache a scale: every call receives the scale it must use.
//!
//! # Examples
//!
//! ```
//! use rasterpanel::geometry::{to_physical, LogicalSize, ScaleFactor};
//!
//! let scale = ScaleFactor::new(1.5).unwrap();
//! let size = to_physical(LogicalSize::new(201.0, 100.0), scale);
//! assert_eq!((size.width, size.height), (301, 150));
//! assert!(size.is_paintable());
//! ```
//!
//! A collapsed layout is "not paintable", never an error:
//!
//! ```
//! use rasterpanel::geometry::{to_physical, LogicalSize, ScaleFactor};
//!
//! let size = to_physical(LogicalSize::new(0.0, 150.0), ScaleFactor::IDENTITY);
//! assert!(!size.is_paintable());
//! ```

use std::fmt;

/// Number of bytes per pixel of every surface and bitmap handled by the bridge.
pub const BYTES_PER_PIXEL: usize = 4;

/// Reference resolution hosts assume for a scale factor of `1.0`.
pub const REFERENCE_DPI: f64 = 96.0;

/// Size of a surface in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const ZERO: PixelSize = PixelSize { width: 0, height: 0 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A size with a zero dimension cannot be painted.
    #[inline]
    pub fn is_paintable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Byte count of a tightly packed 4-byte-per-pixel buffer of this size, or
    /// `None` when such a buffer cannot be addressed.
    pub fn checked_byte_len(&self) -> Option<usize> {
        let len = (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(BYTES_PER_PIXEL)?;
        (len <= isize::MAX as usize).then_some(len)
    }

    /// Like [`PixelSize::checked_byte_len`], saturating at `usize::MAX`. Only
    /// meaningful for sizes that have already been allocated.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.checked_byte_len().unwrap_or(usize::MAX)
    }

    /// Row stride in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        (self.width as usize).saturating_mul(BYTES_PER_PIXEL)
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}px", self.width, self.height)
    }
}

/// Position in device pixels. May be negative while the pointer is captured
/// outside of the control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Destination rectangle in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Rectangle anchored at the origin covering `size`.
    pub fn from_size(size: PixelSize) -> Self {
        Self { x: 0, y: 0, width: size.width, height: size.height }
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }
}

/// Size in host layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Position in host layout units, relative to the control's top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

impl LogicalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`, in logical units.
    pub fn distance(&self, other: LogicalPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Ratio of device pixels to logical units. Always positive and finite.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub const IDENTITY: ScaleFactor = ScaleFactor(1.0);

    /// Returns `None` for zero, negative, NaN or infinite factors.
    pub fn new(factor: f64) -> Option<Self> {
        if factor.is_finite() && factor > 0.0 {
            Some(Self(factor))
        } else {
            None
        }
    }

    /// Accepts whatever the host reports, substituting `fallback` (and then
    /// identity) when the reported value is unusable.
    pub fn or_fallback(factor: f64, fallback: f64) -> Self {
        Self::new(factor).unwrap_or_else(|| {
            log::warn!("host reported unusable scale factor {factor}, using {fallback}");
            Self::new(fallback).unwrap_or(Self::IDENTITY)
        })
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Device-independent resolution metadata attached to presentation bitmaps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dpi {
    pub x: f64,
    pub y: f64,
}

impl Dpi {
    /// `reference / scale` on both axes, so a host interprets a bitmap of
    /// `n` physical pixels as `n / scale` logical units.
    pub fn for_scale(reference: f64, scale: ScaleFactor) -> Self {
        let dpi = reference / scale.get();
        Self { x: dpi, y: dpi }
    }

    /// Scale factor encoded by this metadata relative to `reference`.
    pub fn scale(&self, reference: f64) -> (f64, f64) {
        (reference / self.x, reference / self.y)
    }
}

/// Truncates toward zero and maps anything non-positive to zero.
#[inline]
fn scale_dimension(logical: f64, scale: ScaleFactor) -> u32 {
    let scaled = (logical * scale.get()).trunc();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Converts a logical size into device pixels, truncating each axis toward
/// zero. The result may be unpaintable; callers check [`PixelSize::is_paintable`].
pub fn to_physical(size: LogicalSize, scale: ScaleFactor) -> PixelSize {
    PixelSize {
        width: scale_dimension(size.width, scale),
        height: scale_dimension(size.height, scale),
    }
}

/// Converts a logical point into device pixels, truncating each axis toward zero.
pub fn to_physical_point(point: LogicalPoint, scale: ScaleFactor) -> PixelPoint {
    // `as` saturates out-of-range floats and maps NaN to zero
    PixelPoint {
        x: (point.x * scale.get()).trunc() as i32,
        y: (point.y * scale.get()).trunc() as i32,
    }
}

/// Position of `point` as a fraction of the logical `bounds`, clamped to `[0, 1]`.
///
/// Both operands are logical; a bound `<= 0` yields `0.0` on that axis.
pub fn to_fraction(point: LogicalPoint, bounds: LogicalSize) -> (f32, f32) {
    fn axis(value: f64, extent: f64) -> f32 {
        if extent <= 0.0 || extent.is_nan() {
            return 0.0;
        }
        let fraction = value / extent;
        if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0) as f32
        }
    }

    (axis(point.x, bounds.width), axis(point.y, bounds.height))
}
