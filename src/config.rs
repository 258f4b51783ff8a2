//! Drawer tuning configuration
//!
//! Every constant the drawer uses lives here so hosts can tune feel without
//! touching the engine. Defaults reproduce the stock Flick drawer. Files are
//! TOML; any field left out falls back to its default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drawer::DrawerHeights;
use crate::error::{DrawerError, Result};

/// Drawer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    /// Rest heights of the three states
    pub heights: DrawerHeights,
    /// Distance past a rest offset the drawer must travel before a release
    /// counts as reaching the next state
    pub constraint_padding: f64,
    /// Downward release velocity (px/s) above which the fast settle path runs
    pub velocity_threshold: f64,
    /// Ceiling for the background dim overlay
    pub overlay_max_alpha: f64,
    /// Settle spring duration
    pub settle_duration_ms: u64,
    /// Settle spring damping ratio (1.0 = critically damped)
    pub damping_ratio: f64,
    /// Floor for the derived initial spring velocity
    pub min_spring_velocity: f64,
    /// Ceiling for the derived initial spring velocity
    pub max_spring_velocity: f64,
    /// Header title fade duration
    pub header_fade_ms: u64,
    /// Synthetic release velocity used when the search field takes focus
    pub search_focus_velocity: f64,
    /// Window of touch samples used for velocity estimation
    pub velocity_window_ms: u64,
    /// Movement before a touch becomes a drag
    pub touch_slop: f64,
    /// Height of the drawer header (grabber + search field)
    pub header_height: f64,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            heights: DrawerHeights::default(),
            constraint_padding: 50.0,
            velocity_threshold: 50.0,
            overlay_max_alpha: 0.4,
            settle_duration_ms: 500,
            damping_ratio: 0.6,
            min_spring_velocity: 0.08,
            max_spring_velocity: 20.0,
            header_fade_ms: 100,
            search_focus_velocity: -4536.0,
            velocity_window_ms: 100,
            touch_slop: 10.0,
            header_height: 56.0,
        }
    }
}

impl DrawerConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded drawer config from {:?}", path);
        Ok(config)
    }

    /// Load a config file if it exists, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::info!("No drawer config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let h = &self.heights;
        let fields = [
            ("heights.compressed", h.compressed),
            ("heights.expanded", h.expanded),
            ("heights.full_height_inset", h.full_height_inset),
            ("constraint_padding", self.constraint_padding),
            ("velocity_threshold", self.velocity_threshold),
            ("overlay_max_alpha", self.overlay_max_alpha),
            ("damping_ratio", self.damping_ratio),
            ("min_spring_velocity", self.min_spring_velocity),
            ("max_spring_velocity", self.max_spring_velocity),
            ("search_focus_velocity", self.search_focus_velocity),
            ("touch_slop", self.touch_slop),
            ("header_height", self.header_height),
        ];
        // NaN slips through every ordered comparison below
        if let Some((name, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(DrawerError::InvalidConfig(format!(
                "{} must be a finite number, got {}",
                name, value
            )));
        }
        if h.compressed <= 0.0 || h.expanded <= 0.0 || h.full_height_inset < 0.0 {
            return Err(DrawerError::InvalidConfig(format!(
                "heights must be positive (compressed={}, expanded={}, inset={})",
                h.compressed, h.expanded, h.full_height_inset
            )));
        }
        if h.compressed >= h.expanded {
            return Err(DrawerError::InvalidConfig(format!(
                "compressed height {} must be below expanded height {}",
                h.compressed, h.expanded
            )));
        }
        if self.settle_duration_ms == 0 || self.header_fade_ms == 0 || self.velocity_window_ms == 0 {
            return Err(DrawerError::InvalidConfig(
                "durations must be non-zero".to_string(),
            ));
        }
        if self.damping_ratio <= 0.0 {
            return Err(DrawerError::InvalidConfig(format!(
                "damping ratio must be positive, got {}",
                self.damping_ratio
            )));
        }
        if !(self.min_spring_velocity > 0.0 && self.min_spring_velocity <= self.max_spring_velocity) {
            return Err(DrawerError::InvalidConfig(format!(
                "spring velocity bounds invalid: floor {} ceiling {}",
                self.min_spring_velocity, self.max_spring_velocity
            )));
        }
        if !(0.0..=1.0).contains(&self.overlay_max_alpha) {
            return Err(DrawerError::InvalidConfig(format!(
                "overlay alpha must be within 0..=1, got {}",
                self.overlay_max_alpha
            )));
        }
        if self.constraint_padding < 0.0 || self.touch_slop < 0.0 || self.header_height < 0.0 {
            return Err(DrawerError::InvalidConfig(
                "padding, slop and header height cannot be negative".to_string(),
            ));
        }
        if self.velocity_threshold < 0.0 {
            return Err(DrawerError::InvalidConfig(format!(
                "velocity threshold cannot be negative, got {}",
                self.velocity_threshold
            )));
        }
        Ok(())
    }

    pub fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle_duration_ms)
    }

    pub fn header_fade(&self) -> Duration {
        Duration::from_millis(self.header_fade_ms)
    }

    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }
}
