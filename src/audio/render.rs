//! Offline click-track rendering
//!
//! Runs the same lookahead scheduler as the live clock against a virtual
//! device clock advanced in `lookahead_ms` steps, then mixes the pulses into
//! a mono buffer. Useful for checking beat placement sample by sample.

use std::path::Path;

use super::metronome::{mix_voice, seconds_to_frames, ClickPulse, ClickTone, ClickVoice};
use crate::beat_clock::{BeatEvent, LookaheadScheduler, Tempo};
use crate::config::MetronomeConfig;
use crate::error::AudioError;

/// Longest track `render_click_track` callers should ask for, in seconds
pub const MAX_RENDER_SECONDS: f64 = 600.0;

/// Highest sample rate accepted for offline rendering
pub const MAX_RENDER_SAMPLE_RATE: u32 = 384_000;

/// Mono click track plus the beats it contains.
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub beats: Vec<BeatEvent>,
}

/// Renders `beat_count` beats at `tempo`.
pub fn render_click_track(
    config: &MetronomeConfig,
    tempo: Tempo,
    beat_count: u64,
    sample_rate: u32,
) -> RenderedTrack {
    let mut scheduler =
        LookaheadScheduler::new(tempo, config.beats_per_measure, config.schedule_ahead_s);
    scheduler.reset(0.0, config.start_delay_s);

    let tick = (config.lookahead_ms.max(1)) as f64 / 1000.0;
    let mut now = 0.0;
    let mut beats: Vec<BeatEvent> = Vec::new();
    while (beats.len() as u64) < beat_count {
        now += tick;
        beats.extend(scheduler.fill_window(now));
    }
    beats.truncate(beat_count as usize);

    let (regular, accent) = ClickTone::pair_from_config(config);
    let voices: Vec<ClickVoice> = beats
        .iter()
        .map(|beat| {
            let tone = if beat.is_accent { accent } else { regular };
            ClickVoice::new(ClickPulse::new(beat.scheduled_time, tone), sample_rate)
        })
        .collect();

    let total_frames = beats
        .last()
        .map(|beat| {
            seconds_to_frames(beat.scheduled_time + config.click_duration_s as f64, sample_rate)
                + 1
        })
        .unwrap_or(0);

    let mut samples = vec![0.0_f32; total_frames as usize];
    for voice in &voices {
        mix_voice(&mut samples, 0, voice);
    }

    log::debug!(
        "[Render] {} beats at {} -> {} frames @ {} Hz",
        beats.len(),
        tempo,
        samples.len(),
        sample_rate
    );

    RenderedTrack {
        samples,
        sample_rate,
        beats,
    }
}

/// Writes a rendered track as a 32-bit float mono WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, track: &RenderedTrack) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: track.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &track.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
