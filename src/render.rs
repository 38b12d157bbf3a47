pub mod backend;
pub mod driver;
pub mod surface;

/// Reference renderers.
pub mod backends {
    /// Renderer without pixels
    pub mod null;
    /// CPU rasterizer for render lists
    pub mod software;
}

pub mod render_list;
pub use render_list::*;
