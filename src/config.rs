//! Panel configuration.
//!
//! `PanelConfig` holds the few knobs of a [`RasterPanel`](crate::panel::RasterPanel)
//! that are not dictated by the host or the renderer: the reference DPI used
//! for bitmap metadata, the scale to fall back to when the host reports
//! garbage, the input clock and tap gesture tuning, and the log level used by
//! [`init_logging`].
//!
//! # Examples
//!
//! ```rust
//! use rasterpanel::config::PanelConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = PanelConfig::builder()
//!     .reference_dpi(96.0)
//!     .fallback_scale(1.0)
//!     .double_tap_ms(400)
//!     .build()?;
//! assert_eq!(cfg.double_tap_ms, 400);
//! # Ok(()) }
//! ```
//!
//! Configurations can also be loaded from JSON. Missing fields take their
//! defaults:
//!
//! ```rust
//! use rasterpanel::config::PanelConfig;
//! let cfg = PanelConfig::from_json(r#"{ "tap_slop": 8.0 }"#).unwrap();
//! assert_eq!(cfg.tap_slop, 8.0);
//! assert_eq!(cfg.reference_dpi, 96.0);
//! ```
//!
//! # Errors
//!
//! Validation returns [`PanelConfigError`] for a non-positive reference DPI or
//! fallback scale and for a negative tap slop.

use crate::geometry::REFERENCE_DPI;
use crate::input::TapTracker;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Log verbosity used when installing the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Installs `env_logger` with `level` as the default filter. `RUST_LOG` still
/// wins when set. Safe to call more than once; later calls are ignored.
pub fn init_logging(level: LogLevel) {
    let env = env_logger::Env::default().default_filter_or(level.as_filter());
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_err()
    {
        log::trace!("logger already initialized");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// DPI a host assumes at scale 1.0. Bitmaps carry `reference_dpi / scale`.
    pub reference_dpi: f64,
    /// Scale used when the host reports a non-positive or non-finite factor.
    pub fallback_scale: f64,
    /// Whether the input clock starts running when the panel is created.
    pub clock_running: bool,
    /// Maximum pointer travel, in logical units, for a press/release pair to count as a tap.
    pub tap_slop: f64,
    /// Maximum interval between two taps forming a double tap.
    pub double_tap_ms: u64,
    pub log_level: LogLevel,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            reference_dpi: REFERENCE_DPI,
            fallback_scale: 1.0,
            clock_running: true,
            tap_slop: 4.0,
            double_tap_ms: 500,
            log_level: LogLevel::Info,
        }
    }
}

impl PanelConfig {
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<PanelConfig, PanelConfigError> {
        let cfg: PanelConfig = serde_json::from_str(json).map_err(|e| PanelConfigError::Parse(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PanelConfigError> {
        validate(self)
    }

    /// Tap synthesizer tuned with this configuration's slop and interval.
    pub fn tap_tracker(&self) -> TapTracker {
        TapTracker::new(self.tap_slop, self.double_tap_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    inner: PanelConfig,
}

impl PanelConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut PanelConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn reference_dpi(self, dpi: f64) -> Self { self.map(|c| c.reference_dpi = dpi) }
    pub fn fallback_scale(self, scale: f64) -> Self { self.map(|c| c.fallback_scale = scale) }
    pub fn clock_running(self, on: bool) -> Self { self.map(|c| c.clock_running = on) }
    pub fn tap_slop(self, slop: f64) -> Self { self.map(|c| c.tap_slop = slop) }
    pub fn double_tap_ms(self, ms: u64) -> Self { self.map(|c| c.double_tap_ms = ms) }
    pub fn log_level(self, level: LogLevel) -> Self { self.map(|c| c.log_level = level) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<PanelConfig, PanelConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum PanelConfigError {
    InvalidReferenceDpi(f64),
    InvalidFallbackScale(f64),
    NegativeTapSlop(f64),
    Parse(String),
}

impl fmt::Display for PanelConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelConfigError::InvalidReferenceDpi(d) =>
                write!(f, "reference_dpi {d} must be positive and finite"),
            PanelConfigError::InvalidFallbackScale(s) =>
                write!(f, "fallback_scale {s} must be positive and finite"),
            PanelConfigError::NegativeTapSlop(s) =>
                write!(f, "tap_slop {s} must not be negative"),
            PanelConfigError::Parse(msg) =>
                write!(f, "cannot parse panel config: {msg}"),
        }
    }
}
impl std::error::Error for PanelConfigError {}

fn positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn validate(c: &PanelConfig) -> Result<(), PanelConfigError> {
    if !positive_finite(c.reference_dpi) {
        return Err(PanelConfigError::InvalidReferenceDpi(c.reference_dpi));
    }
    if !positive_finite(c.fallback_scale) {
        return Err(PanelConfigError::InvalidFallbackScale(c.fallback_scale));
    }
    if !(c.tap_slop >= 0.0) {
        return Err(PanelConfigError::NegativeTapSlop(c.tap_slop));
    }
    Ok(())
}
