use crate::config::PanelConfigError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Pixel surface of renderer '{renderer}' is not a packed pixel buffer")]
    SurfaceMismatch { renderer: String },

    #[error("Pixel copy needs {expected} bytes but only {actual} are available")]
    CopyLength { expected: usize, actual: usize },

    #[error("Host error: {0}")]
    Host(#[source] anyhow::Error),

    #[error("Driver error: {0}")]
    Driver(#[source] anyhow::Error),

    #[error("Panel has been disposed")]
    Disposed,

    #[error("Invalid configuration: {0}")]
    Config(#[from] PanelConfigError),
}
