//! Configuration management for the practice aids
//!
//! This module provides runtime configuration loading from JSON files so
//! scheduler timings, click tones, scroll presets and search weights can be
//! tuned without recompilation. Missing sections fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub metronome: MetronomeConfig,
    pub scroll: ScrollConfig,
    pub search: SearchConfig,
    pub audio: AudioConfig,
}

/// Lookahead scheduler and click tone parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Tempo used before any `set_bpm` call
    pub default_bpm: u32,
    /// Beats per measure; beat 0 of each measure is accented
    pub beats_per_measure: u32,
    /// Scheduler tick period in milliseconds
    pub lookahead_ms: u64,
    /// How far ahead of the device clock beats are scheduled, in seconds
    pub schedule_ahead_s: f64,
    /// Delay between `start()` and the first beat, in seconds
    pub start_delay_s: f64,
    /// Regular beat tone frequency in Hz
    pub click_frequency_hz: f32,
    /// Accent beat tone frequency in Hz
    pub accent_frequency_hz: f32,
    /// Click length in seconds
    pub click_duration_s: f32,
    /// Envelope start gain
    pub click_gain: f32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            default_bpm: 120,
            beats_per_measure: 4,
            lookahead_ms: 25,
            schedule_ahead_s: 0.1,
            start_delay_s: 0.05,
            click_frequency_hz: 1000.0,
            accent_frequency_hz: 1500.0,
            click_duration_s: 0.05,
            click_gain: 0.5,
        }
    }
}

/// Auto-scroll presets and termination tolerance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub slow_px_per_s: f64,
    pub medium_px_per_s: f64,
    pub fast_px_per_s: f64,
    /// Distance from the document bottom at which scrolling stops
    pub bottom_tolerance_px: f64,
    /// Pixels advanced per beat when tempo sync is engaged
    pub pixels_per_beat: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            slow_px_per_s: 20.0,
            medium_px_per_s: 40.0,
            fast_px_per_s: 70.0,
            bottom_tolerance_px: 10.0,
            pixels_per_beat: 2.0,
        }
    }
}

/// Ranking weights for the search index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub title_boost: f64,
    pub artist_boost: f64,
    pub tags_boost: f64,
    /// Edit distance tolerance as a fraction of the query term length
    pub fuzzy: f64,
    /// Whether partial terms match longer indexed terms
    pub prefix: bool,
    /// Maximum hits shown in the results panel
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            title_boost: 2.0,
            artist_boost: 1.5,
            tags_boost: 1.0,
            fuzzy: 0.2,
            prefix: true,
            max_results: 10,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capacity of the pulse queue towards the audio callback
    pub pulse_queue_size: usize,
    /// Sample rate used by offline rendering
    pub render_sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            pulse_queue_size: 64,
            render_sample_rate: 48_000,
        }
    }
}

impl PracticeConfig {
    /// Load configuration from JSON file
    ///
    /// If the file doesn't exist or the JSON is invalid, a warning is logged
    /// and the default configuration is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
