//! Tempo - clamped beats-per-minute value
//!
//! Every write goes through a clamp to `[20, 300]`; invalid input never
//! surfaces as an error, the corrected value is returned instead.

use serde::{Deserialize, Serialize};

/// Beats per minute, always within [`Tempo::MIN`]..=[`Tempo::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct Tempo(u32);

impl Tempo {
    pub const MIN: u32 = 20;
    pub const MAX: u32 = 300;
    pub const DEFAULT: Tempo = Tempo(120);
    /// Increment of the up/down tempo controls
    pub const STEP: i64 = 5;

    /// Clamps any integer into the valid range.
    pub fn new(bpm: i64) -> Self {
        Tempo(bpm.clamp(Self::MIN as i64, Self::MAX as i64) as u32)
    }

    /// Parses free-form text input.
    ///
    /// Leading whitespace and an optional sign are accepted, then the leading
    /// run of digits is used (`"140 bpm"` → 140, `"99.9"` → 99). Text without
    /// leading digits yields [`Tempo::DEFAULT`].
    pub fn parse_lenient(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let digits: Vec<u8> = rest
            .bytes()
            .take_while(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        if digits.is_empty() {
            return Self::DEFAULT;
        }

        let magnitude = digits
            .iter()
            .fold(0_i64, |acc, &d| acc.saturating_mul(10).saturating_add(d as i64));
        Self::new(if negative { -magnitude } else { magnitude })
    }

    /// Truncates a float towards zero; NaN yields [`Tempo::DEFAULT`].
    pub fn from_f64(bpm: f64) -> Self {
        if bpm.is_nan() {
            return Self::DEFAULT;
        }
        // `as` saturates on overflow and infinities
        Self::new(bpm.trunc() as i64)
    }

    /// Tempo `delta` BPM away, clamped.
    pub fn nudged(self, delta: i64) -> Self {
        Self::new(self.0 as i64 + delta)
    }

    pub fn bpm(self) -> u32 {
        self.0
    }

    pub fn seconds_per_beat(self) -> f64 {
        60.0 / self.0 as f64
    }

    pub fn ms_per_beat(self) -> f64 {
        60_000.0 / self.0 as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Tempo {
    fn from(bpm: i64) -> Self {
        Tempo::new(bpm)
    }
}

impl From<&str> for Tempo {
    fn from(raw: &str) -> Self {
        Tempo::parse_lenient(raw)
    }
}

impl From<Tempo> for u32 {
    fn from(tempo: Tempo) -> Self {
        tempo.0
    }
}

impl std::fmt::Display for Tempo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}
