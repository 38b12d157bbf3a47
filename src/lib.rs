pub mod config;
pub mod errors;
pub mod events;
pub mod geometry;
pub mod input;
pub mod panel;
pub mod present;
pub mod render;

pub use config::{init_logging, LogLevel, PanelConfig};
pub use errors::BridgeError;
pub use panel::{PanelId, PanelState, RasterPanel};
