//! Render list and display items.
//!
//! The scene consumed by the [`SoftwareRenderer`](crate::render::backends::software::SoftwareRenderer):
//! an ordered list of [`DisplayItem`] commands. Rectangles are placed in
//! *fractional* coordinates (`0.0 ..= 1.0` of the surface on each axis), so a
//! scene stays valid across resizes and scale factor changes.
//!
//! # Example
//!
//! ```rust
//! use rasterpanel::render::render_list::{RenderList, DisplayItem, Color};
//!
//! let mut list = RenderList::new();
//!
//! // Clear background
//! list.add_command(DisplayItem::Clear { color: Color::from_u8(0, 0, 0, 255) });
//!
//! // A pickable white rectangle covering the centre quarter
//! list.add_command(DisplayItem::Rect {
//!     x: 0.25,
//!     y: 0.25,
//!     w: 0.5,
//!     h: 0.5,
//!     color: Color::from_u8(255, 255, 255, 255),
//!     id: Some(7),
//! });
//!
//! assert_eq!(list.pick(0.5, 0.5), Some(7));
//! assert_eq!(list.pick(0.1, 0.1), None);
//! ```

/// RGBA color.
///
/// Channels are represented as `f32` in the range `0.0 ..= 1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel (opacity)
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    /// Creates a new color from `f32` channel values in the range `0.0 ..= 1.0`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }

    /// Creates a new color from `u8` channel values in the range `0 ..= 255`.
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Channels as `[r, g, b, a]` bytes (0–255).
    pub fn to_u8_array(&self) -> [u8; 4] {
        fn channel(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }
}

/// A single drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayItem {
    /// Clear the entire surface with the given color.
    Clear {
        /// The color to clear the surface with.
        color: Color,
    },

    /// Fill a rectangle. Coordinates are fractions of the surface size.
    Rect {
        /// Left edge, as a fraction of the surface width.
        x: f32,
        /// Top edge, as a fraction of the surface height.
        y: f32,
        /// Width, as a fraction of the surface width.
        w: f32,
        /// Height, as a fraction of the surface height.
        h: f32,
        /// The color to fill the rectangle with.
        color: Color,
        /// Object id reported by picking, `None` for decoration.
        id: Option<u32>,
    },
}

/// A list of display items to be rendered, in painting order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderList {
    /// Sequence of drawing commands to execute.
    pub items: Vec<DisplayItem>,
}

impl RenderList {
    /// Creates a new, empty render list.
    pub fn new() -> Self {
        RenderList { items: Vec::new() }
    }

    /// Adds a new display item (drawing command) to the list.
    pub fn add_command(&mut self, command: DisplayItem) {
        self.items.push(command);
    }

    /// Clears all display items from the list.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Id of the topmost pickable rectangle containing the fractional point.
    pub fn pick(&self, fx: f32, fy: f32) -> Option<u32> {
        self.items.iter().rev().find_map(|item| match item {
            DisplayItem::Rect { x, y, w, h, id: Some(id), .. }
                if fx >= *x && fx < x + w && fy >= *y && fy < y + h =>
            {
                Some(*id)
            }
            _ => None,
        })
    }
}
