//! Backend abstractions for the beat clock's audio output.
//!
//! The scheduler never plays sound itself: it feeds timestamped pulses to an
//! [`AudioOutput`], which owns the device clock and performs exact-time
//! playback.

use std::sync::Arc;

use crate::audio::metronome::ClickPulse;
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Power state of an output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Clock is advancing and queued pulses are played.
    Running,
    /// Clock is frozen; the device must be resumed before beats are audible.
    Suspended,
}

/// Trait implemented by audio outputs that can play pulses at device-clock times.
///
/// `current_time` is the device's own monotonic clock in seconds. It must not
/// be derived from timer callbacks, which drift and jitter.
pub trait AudioOutput: Send + Sync {
    fn current_time(&self) -> f64;
    fn state(&self) -> DeviceState;
    fn resume(&self) -> Result<(), AudioError>;
    fn schedule_click(&self, pulse: ClickPulse) -> Result<(), AudioError>;
}

/// Lazily invoked constructor for the output device.
///
/// The beat clock calls this on its first `start()` so the device is acquired
/// from a user-initiated call path.
pub type OutputFactory = Arc<dyn Fn() -> Result<Arc<dyn AudioOutput>, AudioError> + Send + Sync>;

/// Platform default output factory.
pub fn default_output_factory(config: AudioConfig) -> OutputFactory {
    cfg_if::cfg_if! {
        if #[cfg(not(target_os = "android"))] {
            Arc::new(move || {
                let engine = crate::audio::engine_cpal::ClickEngine::open(&config)?;
                Ok(Arc::new(engine) as Arc<dyn AudioOutput>)
            })
        } else {
            let _ = config;
            Arc::new(|| Ok(Arc::new(StubOutput::with_tokio_clock()) as Arc<dyn AudioOutput>))
        }
    }
}

/// Factory handing out one shared output instance, for tests and tooling.
pub fn shared_output_factory(output: Arc<dyn AudioOutput>) -> OutputFactory {
    Arc::new(move || Ok(Arc::clone(&output)))
}

mod desktop_stub;
pub use desktop_stub::{ManualClock, StubOutput};
