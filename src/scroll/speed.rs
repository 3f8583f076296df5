use std::str::FromStr;

use crate::config::ScrollConfig;

/// Named scroll speed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSpeed {
    Slow,
    Medium,
    Fast,
}

impl FromStr for ScrollSpeed {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "slow" => Ok(ScrollSpeed::Slow),
            "medium" => Ok(ScrollSpeed::Medium),
            "fast" => Ok(ScrollSpeed::Fast),
            _ => Err(()),
        }
    }
}

/// Pixel rates behind each preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedPresets {
    pub slow: f64,
    pub medium: f64,
    pub fast: f64,
}

impl SpeedPresets {
    pub fn from_config(config: &ScrollConfig) -> Self {
        Self {
            slow: config.slow_px_per_s,
            medium: config.medium_px_per_s,
            fast: config.fast_px_per_s,
        }
    }

    pub fn rate(&self, speed: ScrollSpeed) -> f64 {
        match speed {
            ScrollSpeed::Slow => self.slow,
            ScrollSpeed::Medium => self.medium,
            ScrollSpeed::Fast => self.fast,
        }
    }
}

impl Default for SpeedPresets {
    fn default() -> Self {
        Self::from_config(&ScrollConfig::default())
    }
}
