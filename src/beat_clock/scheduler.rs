//! Lookahead scheduler - the timing core of the beat clock
//!
//! Beats are timestamped on the audio device's clock, not on timer time.
//! A coarse periodic tick only has to keep the window
//! `[now, now + schedule_ahead)` filled; the device plays each pulse at its
//! exact timestamp, so tick jitter never reaches the audible beat.

use serde::{Deserialize, Serialize};

use super::tempo::Tempo;

/// One beat produced by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatEvent {
    pub sequence_number: u64,
    pub is_accent: bool,
    /// Device-clock time in seconds at which the beat sounds
    pub scheduled_time: f64,
}

/// Pure lookahead scheduling state.
///
/// Holds no timers or devices; callers pass the device time on every tick.
#[derive(Debug, Clone)]
pub struct LookaheadScheduler {
    tempo: Tempo,
    beats_per_measure: u32,
    schedule_ahead: f64,
    next_beat_time: f64,
    sequence: u64,
}

impl LookaheadScheduler {
    /// `beats_per_measure` of 0 is treated as 1 (every beat accented).
    pub fn new(tempo: Tempo, beats_per_measure: u32, schedule_ahead: f64) -> Self {
        Self {
            tempo,
            beats_per_measure: beats_per_measure.max(1),
            schedule_ahead,
            next_beat_time: 0.0,
            sequence: 0,
        }
    }

    /// Restarts the beat sequence with the first beat at `now + start_delay`.
    pub fn reset(&mut self, now: f64, start_delay: f64) {
        self.sequence = 0;
        self.next_beat_time = now + start_delay;
    }

    /// Changes the interval used for beats not yet scheduled.
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn next_beat_time(&self) -> f64 {
        self.next_beat_time
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_accent(&self, sequence_number: u64) -> bool {
        sequence_number % self.beats_per_measure as u64 == 0
    }

    /// Emits every beat whose time falls before `now + schedule_ahead`.
    pub fn fill_window(&mut self, now: f64) -> Vec<BeatEvent> {
        let horizon = now + self.schedule_ahead;
        let mut beats = Vec::new();
        while self.next_beat_time < horizon {
            beats.push(BeatEvent {
                sequence_number: self.sequence,
                is_accent: self.is_accent(self.sequence),
                scheduled_time: self.next_beat_time,
            });
            self.sequence += 1;
            self.next_beat_time += self.tempo.seconds_per_beat();
        }
        beats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(bpm: i64) -> LookaheadScheduler {
        let mut s = LookaheadScheduler::new(Tempo::new(bpm), 4, 0.1);
        s.reset(0.0, 0.05);
        s
    }

    #[test]
    fn test_accent_pattern_four_four() {
        let s = scheduler(120);
        let accents: Vec<bool> = (0..8).map(|n| s.is_accent(n)).collect();
        assert_eq!(
            accents,
            vec![true, false, false, false, true, false, false, false]
        );
    }

    #[test]
    fn test_first_beat_after_start_delay() {
        let mut s = scheduler(120);
        assert!(s.fill_window(-0.06).is_empty());

        let beats = s.fill_window(0.0);
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].sequence_number, 0);
        assert!(beats[0].is_accent);
        assert_eq!(beats[0].scheduled_time, 0.05);
    }

    #[test]
    fn test_window_is_not_rescheduled() {
        let mut s = scheduler(120);
        assert_eq!(s.fill_window(0.0).len(), 1);
        assert!(s.fill_window(0.01).is_empty());
        assert!(s.fill_window(0.4).is_empty());
        assert_eq!(s.fill_window(0.46).len(), 1);
    }

    #[test]
    fn test_intervals_are_exact_under_jitter() {
        let mut s = scheduler(120);
        let ticks = [0.0, 0.031, 0.049, 0.12, 0.3, 0.301, 0.9, 1.02, 1.6, 2.4];
        let beats: Vec<BeatEvent> = ticks.iter().flat_map(|&t| s.fill_window(t)).collect();

        assert!(beats.len() >= 5);
        for (i, pair) in beats.windows(2).enumerate() {
            assert_eq!(pair[1].sequence_number, pair[0].sequence_number + 1);
            let gap = pair[1].scheduled_time - pair[0].scheduled_time;
            assert!((gap - 0.5).abs() < 1e-9, "gap after beat {} was {}", i, gap);
        }
    }

    #[test]
    fn test_tempo_change_affects_only_unscheduled_beats() {
        let mut s = scheduler(60);
        let first = s.fill_window(0.0);
        assert_eq!(first[0].scheduled_time, 0.05);
        // Next beat already advanced with the old interval
        assert!((s.next_beat_time() - 1.05).abs() < 1e-12);

        s.set_tempo(Tempo::new(120));
        let second = s.fill_window(1.0);
        assert!((second[0].scheduled_time - 1.05).abs() < 1e-12);
        let third = s.fill_window(1.5);
        assert!((third[0].scheduled_time - 1.55).abs() < 1e-9);
    }

    #[test]
    fn test_zero_beats_per_measure_accents_everything() {
        let s = LookaheadScheduler::new(Tempo::DEFAULT, 0, 0.1);
        assert!((0..4).all(|n| s.is_accent(n)));
    }
}
