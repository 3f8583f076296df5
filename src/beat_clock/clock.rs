//! BeatClock - runtime wrapper around the lookahead scheduler
//!
//! Two independent clocks drive a running metronome:
//! - a coarse tokio interval (the scheduler tick, every `lookahead_ms`)
//!   that keeps the device queue filled
//! - the audio device clock, which stamps and plays every pulse
//!
//! Visual beat callbacks are deferred by `scheduled_time - now` so they fire
//! in phase with the audible click rather than at scheduling time.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::BroadcastStream;

use super::pending::PendingBeats;
use super::scheduler::{BeatEvent, LookaheadScheduler};
use super::tempo::Tempo;
use crate::audio::metronome::{ClickPulse, ClickTone};
use crate::config::{AudioConfig, MetronomeConfig};
use crate::engine::backend::{default_output_factory, AudioOutput, DeviceState, OutputFactory};
use crate::error::{log_audio_error, AudioError};

/// Capacity of the beat broadcast channel
const BEAT_CHANNEL_CAPACITY: usize = 64;

/// Visual beat callback
pub type BeatObserver = Arc<dyn Fn(BeatEvent) + Send + Sync>;

/// Tempo-change callback, invoked synchronously from `set_bpm`
pub type TempoObserver = Box<dyn Fn(Tempo) + Send + Sync>;

/// State shared between the clock, its tick task and pending callbacks.
struct ClockShared {
    running: bool,
    /// Bumped on every start; tasks from older runs never deliver
    generation: u64,
    scheduler: LookaheadScheduler,
    pending: PendingBeats,
    on_beat: Option<BeatObserver>,
}

/// Metronome with sample-accurate clicks and phase-aligned beat callbacks.
///
/// # Example
/// ```ignore
/// let mut clock = BeatClock::with_default_output(MetronomeConfig::default(), AudioConfig::default());
/// clock.set_beat_observer(|beat| println!("beat {}", beat.sequence_number));
/// clock.start()?; // from a user-initiated call path, inside a tokio runtime
/// clock.set_bpm(140);
/// clock.stop();
/// ```
pub struct BeatClock {
    config: MetronomeConfig,
    regular_tone: ClickTone,
    accent_tone: ClickTone,
    factory: OutputFactory,
    output: Option<Arc<dyn AudioOutput>>,
    shared: Arc<Mutex<ClockShared>>,
    ticker: Option<JoinHandle<()>>,
    tempo: Tempo,
    tempo_observer: Option<TempoObserver>,
    tempo_tx: watch::Sender<Tempo>,
    beat_tx: broadcast::Sender<BeatEvent>,
}

impl BeatClock {
    /// Creates a stopped clock. The output device is not acquired until the
    /// first `start()`.
    pub fn new(config: MetronomeConfig, factory: OutputFactory) -> Self {
        let tempo = Tempo::new(config.default_bpm as i64);
        let (regular_tone, accent_tone) = ClickTone::pair_from_config(&config);
        let scheduler =
            LookaheadScheduler::new(tempo, config.beats_per_measure, config.schedule_ahead_s);
        let (tempo_tx, _) = watch::channel(tempo);
        let (beat_tx, _) = broadcast::channel(BEAT_CHANNEL_CAPACITY);

        Self {
            config,
            regular_tone,
            accent_tone,
            factory,
            output: None,
            shared: Arc::new(Mutex::new(ClockShared {
                running: false,
                generation: 0,
                scheduler,
                pending: PendingBeats::new(),
                on_beat: None,
            })),
            ticker: None,
            tempo,
            tempo_observer: None,
            tempo_tx,
            beat_tx,
        }
    }

    /// Clock backed by the platform's default output device.
    pub fn with_default_output(config: MetronomeConfig, audio: AudioConfig) -> Self {
        Self::new(config, default_output_factory(audio))
    }

    /// Starts the metronome; a no-op when already running.
    ///
    /// Must be called inside a tokio runtime. Device acquisition errors are
    /// returned unchanged for the caller to report.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.is_running() {
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| AudioError::RuntimeUnavailable)?;
        let output = self.acquire_output()?;
        if output.state() == DeviceState::Suspended {
            output.resume()?;
        }

        let generation = {
            let mut shared = lock_shared(&self.shared);
            shared.generation += 1;
            shared.running = true;
            shared.scheduler.set_tempo(self.tempo);
            shared
                .scheduler
                .reset(output.current_time(), self.config.start_delay_s);
            shared.generation
        };

        let ctx = TickContext {
            shared: Arc::clone(&self.shared),
            output,
            regular_tone: self.regular_tone,
            accent_tone: self.accent_tone,
            beat_tx: self.beat_tx.clone(),
            generation,
        };
        let period = Duration::from_millis(self.config.lookahead_ms.max(1));
        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !ctx.tick() {
                    break;
                }
            }
        }));

        log::info!(
            "[BeatClock] Started at {} ({} beats per measure)",
            self.tempo,
            self.config.beats_per_measure
        );
        Ok(())
    }

    /// Stops the metronome and cancels every pending beat callback.
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        let (was_running, cancelled) = {
            let mut shared = lock_shared(&self.shared);
            let was_running = shared.running;
            shared.running = false;
            (was_running, shared.pending.cancel_all())
        };
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if was_running {
            log::info!(
                "[BeatClock] Stopped ({} pending beat callbacks cancelled)",
                cancelled
            );
        }
    }

    /// Returns the new running state.
    pub fn toggle(&mut self) -> Result<bool, AudioError> {
        if self.is_running() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.is_running())
    }

    /// Sets the tempo from a number, clamped to [20, 300].
    pub fn set_bpm(&mut self, bpm: i64) -> Tempo {
        self.apply_tempo(Tempo::new(bpm))
    }

    /// Sets the tempo from text input; non-numeric text yields 120.
    pub fn set_bpm_text(&mut self, raw: &str) -> Tempo {
        self.apply_tempo(Tempo::parse_lenient(raw))
    }

    /// Moves the tempo by `delta` BPM (the up/down controls use
    /// `±Tempo::STEP`), clamped to [20, 300].
    pub fn nudge_bpm(&mut self, delta: i64) -> Tempo {
        self.apply_tempo(self.tempo.nudged(delta))
    }

    fn apply_tempo(&mut self, tempo: Tempo) -> Tempo {
        self.tempo = tempo;
        lock_shared(&self.shared).scheduler.set_tempo(tempo);
        self.tempo_tx.send_replace(tempo);
        if let Some(observer) = &self.tempo_observer {
            observer(tempo);
        }
        log::debug!("[BeatClock] Tempo set to {}", tempo);
        tempo
    }

    pub fn bpm(&self) -> Tempo {
        self.tempo
    }

    pub fn ms_per_beat(&self) -> f64 {
        self.tempo.ms_per_beat()
    }

    pub fn is_running(&self) -> bool {
        lock_shared(&self.shared).running
    }

    /// Number of visual callbacks scheduled but not yet fired.
    pub fn pending_callbacks(&self) -> usize {
        lock_shared(&self.shared).pending.len()
    }

    pub fn set_beat_observer<F>(&mut self, observer: F)
    where
        F: Fn(BeatEvent) + Send + Sync + 'static,
    {
        lock_shared(&self.shared).on_beat = Some(Arc::new(observer));
    }

    pub fn clear_beat_observer(&mut self) {
        lock_shared(&self.shared).on_beat = None;
    }

    pub fn set_tempo_observer<F>(&mut self, observer: F)
    where
        F: Fn(Tempo) + Send + Sync + 'static,
    {
        self.tempo_observer = Some(Box::new(observer));
    }

    /// Receiver that observes every tempo change.
    pub fn subscribe_tempo(&self) -> watch::Receiver<Tempo> {
        self.tempo_tx.subscribe()
    }

    /// Receiver for beats as they are delivered (in phase with the click).
    pub fn subscribe_beats(&self) -> broadcast::Receiver<BeatEvent> {
        self.beat_tx.subscribe()
    }

    /// Delivered beats as a stream; lagged beats are skipped.
    pub fn beat_stream(&self) -> impl Stream<Item = BeatEvent> {
        BroadcastStream::new(self.beat_tx.subscribe())
            .filter_map(|result| futures::future::ready(result.ok()))
    }

    /// Output acquired by the first `start()`, if any.
    pub fn output(&self) -> Option<Arc<dyn AudioOutput>> {
        self.output.clone()
    }

    fn acquire_output(&mut self) -> Result<Arc<dyn AudioOutput>, AudioError> {
        if let Some(output) = &self.output {
            return Ok(Arc::clone(output));
        }
        let output = (self.factory)().map_err(|err| {
            log_audio_error(&err, "acquire_output");
            err
        })?;
        self.output = Some(Arc::clone(&output));
        Ok(output)
    }
}

impl Drop for BeatClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything a tick task and its deferred callbacks need.
#[derive(Clone)]
struct TickContext {
    shared: Arc<Mutex<ClockShared>>,
    output: Arc<dyn AudioOutput>,
    regular_tone: ClickTone,
    accent_tone: ClickTone,
    beat_tx: broadcast::Sender<BeatEvent>,
    generation: u64,
}

impl TickContext {
    /// One scheduler pass. Returns false once this run has been stopped.
    fn tick(&self) -> bool {
        let mut shared = lock_shared(&self.shared);
        if !shared.running || shared.generation != self.generation {
            return false;
        }

        let now = self.output.current_time();
        let beats = shared.scheduler.fill_window(now);
        let wants_callbacks = shared.on_beat.is_some() || self.beat_tx.receiver_count() > 0;

        for beat in beats {
            let tone = if beat.is_accent {
                self.accent_tone
            } else {
                self.regular_tone
            };
            if let Err(err) = self
                .output
                .schedule_click(ClickPulse::new(beat.scheduled_time, tone))
            {
                log_audio_error(&err, "scheduler_tick");
            }
            tracing::trace!(
                sequence = beat.sequence_number,
                accent = beat.is_accent,
                at = beat.scheduled_time,
                now,
                "beat scheduled"
            );

            if wants_callbacks {
                let delay = Duration::from_secs_f64((beat.scheduled_time - now).max(0.0));
                let ctx = self.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    ctx.deliver(beat);
                });
                shared
                    .pending
                    .track(self.generation, beat.sequence_number, task.abort_handle());
            }
        }
        true
    }

    fn deliver(&self, beat: BeatEvent) {
        let observer = {
            let mut shared = lock_shared(&self.shared);
            shared.pending.complete(self.generation, beat.sequence_number);
            if !shared.running || shared.generation != self.generation {
                return;
            }
            shared.on_beat.clone()
        };

        if let Some(observer) = observer {
            observer(beat);
        }
        let _ = self.beat_tx.send(beat);
    }
}

fn lock_shared(shared: &Mutex<ClockShared>) -> MutexGuard<'_, ClockShared> {
    shared.lock().unwrap_or_else(|poisoned| {
        log::warn!("[BeatClock] Shared state lock poisoned, recovering");
        poisoned.into_inner()
    })
}
