//! Metronome - click tone synthesis
//!
//! This module turns timestamped [`ClickPulse`]s into audio samples.
//! Key features:
//! - Short sine tones, accent beats pitched higher than regular beats
//! - Exponential decay envelope so clicks end without a pop
//! - Frame-exact voices: playback position is derived from the device frame
//!   counter, never from wall-clock time
//! - Zero allocations in the per-sample functions

use std::f32::consts::TAU;

use crate::config::MetronomeConfig;

/// Gain the envelope decays to at the end of a click
pub const ENVELOPE_FLOOR: f32 = 0.001;

/// Tone parameters for one kind of click (regular or accent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickTone {
    pub frequency_hz: f32,
    pub duration_s: f32,
    pub peak_gain: f32,
}

impl ClickTone {
    /// Regular and accent tones described by the metronome config
    pub fn pair_from_config(config: &MetronomeConfig) -> (ClickTone, ClickTone) {
        let regular = ClickTone {
            frequency_hz: config.click_frequency_hz,
            duration_s: config.click_duration_s,
            peak_gain: config.click_gain,
        };
        let accent = ClickTone {
            frequency_hz: config.accent_frequency_hz,
            ..regular
        };
        (regular, accent)
    }
}

/// A click scheduled to start at an exact device-clock time (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPulse {
    pub start_time: f64,
    pub tone: ClickTone,
}

impl ClickPulse {
    pub fn new(start_time: f64, tone: ClickTone) -> Self {
        Self { start_time, tone }
    }
}

/// Envelope gain `elapsed_s` seconds into a click.
///
/// Exponential ramp from `peak_gain` to [`ENVELOPE_FLOOR`] over the click
/// duration; silent outside `[0, duration)`.
#[inline]
pub fn envelope_gain(tone: &ClickTone, elapsed_s: f32) -> f32 {
    if elapsed_s < 0.0 || elapsed_s >= tone.duration_s || tone.peak_gain <= 0.0 {
        return 0.0;
    }
    let progress = elapsed_s / tone.duration_s;
    tone.peak_gain * (ENVELOPE_FLOOR / tone.peak_gain).powf(progress)
}

/// Sample `index` frames into a click at the given sample rate.
#[inline]
pub fn click_sample(tone: &ClickTone, index: u64, sample_rate: u32) -> f32 {
    let t = index as f32 / sample_rate as f32;
    envelope_gain(tone, t) * (TAU * tone.frequency_hz * t).sin()
}

/// Converts a device-clock time in seconds to a frame index.
#[inline]
pub fn seconds_to_frames(seconds: f64, sample_rate: u32) -> u64 {
    (seconds.max(0.0) * sample_rate as f64).round() as u64
}

/// Renders one complete click into a new buffer.
///
/// The buffer holds exactly `duration_s` worth of samples.
pub fn generate_click_sample(tone: &ClickTone, sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * tone.duration_s) as usize;
    (0..num_samples as u64)
        .map(|i| click_sample(tone, i, sample_rate))
        .collect()
}

/// A pulse pinned to device frames, ready to be mixed by an audio callback.
#[derive(Debug, Clone, Copy)]
pub struct ClickVoice {
    start_frame: u64,
    frame_len: u64,
    tone: ClickTone,
    sample_rate: u32,
}

impl ClickVoice {
    pub fn new(pulse: ClickPulse, sample_rate: u32) -> Self {
        Self {
            start_frame: seconds_to_frames(pulse.start_time, sample_rate),
            frame_len: (pulse.tone.duration_s as f64 * sample_rate as f64) as u64,
            tone: pulse.tone,
            sample_rate,
        }
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Moves a late voice up to `frame` so it still plays from its first
    /// sample instead of being skipped or cut into mid-envelope.
    #[inline]
    pub fn not_before(mut self, frame: u64) -> Self {
        self.start_frame = self.start_frame.max(frame);
        self
    }

    /// Sample contributed at absolute device frame `frame`, if any.
    #[inline]
    pub fn sample_at(&self, frame: u64) -> Option<f32> {
        if frame < self.start_frame {
            return None;
        }
        let offset = frame - self.start_frame;
        if offset >= self.frame_len {
            return None;
        }
        Some(click_sample(&self.tone, offset, self.sample_rate))
    }

    /// True once every frame of the voice lies before `frame`.
    #[inline]
    pub fn finished_by(&self, frame: u64) -> bool {
        frame >= self.start_frame + self.frame_len
    }
}

/// Mixes a voice into a buffer whose first sample sits at `buffer_start_frame`.
pub fn mix_voice(buffer: &mut [f32], buffer_start_frame: u64, voice: &ClickVoice) {
    let first = voice.start_frame.saturating_sub(buffer_start_frame) as usize;
    for (i, slot) in buffer.iter_mut().enumerate().skip(first) {
        match voice.sample_at(buffer_start_frame + i as u64) {
            Some(sample) => *slot += sample,
            None if voice.finished_by(buffer_start_frame + i as u64) => break,
            None => {}
        }
    }
}
